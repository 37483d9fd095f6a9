//! View-state persistence keyed by the root product model.
//!
//! The store behaves like browser session storage: string keys, string
//! values, read once when a dataset loads and written on every change.
//! Storage failures never reach the caller; a failed read is "no prior
//! state" and a failed write is logged and dropped.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collapse::CollapsedSubmodels;
use crate::sort::{SortColumn, SortDirection, TreeSort};
use crate::tree::ViewOptions;

const KEY_PREFIX: &str = "tree-view:";

/// Storage key for the view state of the tree rooted at `root_identifier`.
pub fn state_key(root_identifier: &str) -> String {
    format!("{}{}", KEY_PREFIX, root_identifier)
}

// ---------------------------------------------------------------------------
// PersistedState
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub sort_column: SortColumn,
    pub sort_direction: SortDirection,
    pub search_query: String,
    pub show_hidden: bool,
    pub collapsed_submodels: Vec<String>,
}

impl PersistedState {
    pub fn capture(options: &ViewOptions) -> Self {
        Self {
            sort_column: options.sort.column,
            sort_direction: options.sort.direction,
            search_query: options.query.clone(),
            show_hidden: options.show_hidden,
            collapsed_submodels: options.collapsed.ids().to_vec(),
        }
    }

    pub fn into_options(self) -> ViewOptions {
        ViewOptions {
            sort: TreeSort::new(self.sort_column, self.sort_direction),
            query: self.search_query,
            show_hidden: self.show_hidden,
            collapsed: CollapsedSubmodels::from_ids(self.collapsed_submodels),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

pub trait SessionStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String) -> io::Result<()>;
}

/// Store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: BTreeMap<String, String>,
}

impl SessionStore for MemorySessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> io::Result<()> {
        self.items.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk, rewritten on every set.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileSessionStore {
    /// Open the store at `path`. A missing or unreadable file yields an
    /// empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring unreadable session store");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read session store");
                BTreeMap::new()
            }
        };
        Self { path, items }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the complete JSON file atomically (write to .tmp, then rename).
    fn write_file(&self) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.items)?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)
    }
}

impl SessionStore for FileSessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) -> io::Result<()> {
        self.items.insert(key.to_string(), value);
        self.write_file()
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Read the state saved for `root_identifier`, if any parses.
pub fn load_state(store: &dyn SessionStore, root_identifier: &str) -> Option<PersistedState> {
    let key = state_key(root_identifier);
    let raw = store.get_item(&key)?;
    match serde_json::from_str(&raw) {
        Ok(state) => Some(state),
        Err(e) => {
            debug!(%key, error = %e, "discarding unparseable view state");
            None
        }
    }
}

/// Save `state` for `root_identifier`. Failures are logged and swallowed.
pub fn save_state(store: &mut dyn SessionStore, root_identifier: &str, state: &PersistedState) {
    let key = state_key(root_identifier);
    let value = match serde_json::to_string(state) {
        Ok(value) => value,
        Err(e) => {
            warn!(%key, error = %e, "failed to serialize view state");
            return;
        }
    };
    if let Err(e) = store.set_item(&key, value) {
        warn!(%key, error = %e, "failed to persist view state");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    impl SessionStore for FailingStore {
        fn get_item(&self, _key: &str) -> Option<String> {
            None
        }

        fn set_item(&mut self, _key: &str, _value: String) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "quota exceeded"))
        }
    }

    fn sample_state() -> PersistedState {
        PersistedState {
            sort_column: SortColumn::Label,
            sort_direction: SortDirection::Desc,
            search_query: "hello".to_string(),
            show_hidden: true,
            collapsed_submodels: vec!["sub1".to_string()],
        }
    }

    #[test]
    fn test_state_key() {
        assert_eq!(state_key("tshirt_classic"), "tree-view:tshirt_classic");
    }

    #[test]
    fn test_persisted_state_json_shape() {
        let json = serde_json::to_value(sample_state()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "sortColumn": "label",
                "sortDirection": "desc",
                "searchQuery": "hello",
                "showHidden": true,
                "collapsedSubmodels": ["sub1"],
            })
        );
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemorySessionStore::default();
        save_state(&mut store, "tshirt_classic", &sample_state());
        assert!(store.get_item("tree-view:tshirt_classic").is_some());
        assert_eq!(
            load_state(&store, "tshirt_classic"),
            Some(sample_state())
        );
        assert_eq!(load_state(&store, "other_root"), None);
    }

    #[test]
    fn test_unparseable_state_is_absent() {
        let mut store = MemorySessionStore::default();
        store
            .set_item("tree-view:root", "{not json".to_string())
            .unwrap();
        assert_eq!(load_state(&store, "root"), None);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let mut store = FailingStore;
        save_state(&mut store, "root", &sample_state());
        assert_eq!(load_state(&store, "root"), None);
    }

    #[test]
    fn test_capture_and_restore_view_options() {
        let mut options = ViewOptions::default();
        options.sort.click(SortColumn::Variant);
        options.query = "red".to_string();
        options.collapsed.toggle("sub_b");
        options.collapsed.toggle("sub_a");

        let persisted = PersistedState::capture(&options);
        assert_eq!(persisted.collapsed_submodels, ["sub_b", "sub_a"]);
        assert_eq!(persisted.into_options(), options);
    }

    #[test]
    fn test_file_store_round_trips_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut store = FileSessionStore::open(&path);
        save_state(&mut store, "root", &sample_state());
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let reopened = FileSessionStore::open(&path);
        assert_eq!(load_state(&reopened, "root"), Some(sample_state()));
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "garbage").unwrap();

        let store = FileSessionStore::open(&path);
        assert_eq!(store.get_item("tree-view:root"), None);
        assert_eq!(store.path(), path.as_path());
    }
}
