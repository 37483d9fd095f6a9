use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use globset::Glob;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::TreeError;
use crate::product::ProductRow;

/// Default glob for dataset files inside a data directory.
pub const DEFAULT_DATASET_GLOB: &str = "product-models-*.json";

/// Dataset picked by default when a data directory offers several.
const PREFERRED_DATASET_LABEL: &str = "1000 rows";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// DataSource
// ---------------------------------------------------------------------------

/// Whether the remote tree is requested for a product model or a product.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TreeScope {
    #[default]
    Model,
    Product,
}

impl TreeScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeScope::Model => "model",
            TreeScope::Product => "product",
        }
    }
}

/// Where the full row set for one view session comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
    /// A JSON array of rows on disk.
    File(PathBuf),
    /// The tree endpoint of a PIM instance.
    Http {
        base_url: String,
        scope: TreeScope,
        technical_id: String,
    },
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Http { .. } => write!(f, "{}", self.tree_url()),
        }
    }
}

impl DataSource {
    /// Fetch the complete row set. One request, no retries.
    pub fn fetch(&self) -> Result<Vec<ProductRow>, TreeError> {
        let rows = match self {
            DataSource::File(path) => read_rows(path)?,
            DataSource::Http {
                scope,
                technical_id,
                ..
            } => fetch_rows(&self.tree_url(), *scope, technical_id)?,
        };
        info!(source = %self, rows = rows.len(), "loaded product rows");
        Ok(rows)
    }

    /// The file this source reads, if it is file-backed.
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            DataSource::File(path) => Some(path),
            DataSource::Http { .. } => None,
        }
    }

    fn tree_url(&self) -> String {
        match self {
            DataSource::File(path) => path.display().to_string(),
            DataSource::Http { base_url, .. } => format!(
                "{}/enrich/product-model/rest/tree",
                base_url.trim_end_matches('/')
            ),
        }
    }
}

fn read_rows(path: &Path) -> Result<Vec<ProductRow>, TreeError> {
    let raw = fs::read_to_string(path).map_err(|source| TreeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

fn fetch_rows(url: &str, scope: TreeScope, technical_id: &str) -> Result<Vec<ProductRow>, TreeError> {
    let transport = |source| TreeError::Transport {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(transport)?;

    debug!(%url, scope = scope.as_str(), technical_id, "requesting product tree");
    let response = client
        .get(url)
        .query(&[("product_type", scope.as_str()), ("technical_id", technical_id)])
        .header("X-Requested-With", "XMLHttpRequest")
        .send()
        .map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(TreeError::Http {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().map_err(transport)?;
    Ok(serde_json::from_str(&body)?)
}

// ---------------------------------------------------------------------------
// Dataset discovery
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetEntry {
    pub path: PathBuf,
    pub label: String,
}

/// Find dataset files under `dir` whose file name matches `pattern`,
/// sorted by path.
pub fn discover_datasets(dir: &Path, pattern: &str) -> Result<Vec<DatasetEntry>> {
    let matcher = Glob::new(pattern)
        .with_context(|| format!("invalid dataset pattern {:?}", pattern))?
        .compile_matcher();

    if !dir.is_dir() {
        anyhow::bail!("Data directory does not exist: {}", dir.display());
    }

    let mut entries: Vec<DatasetEntry> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| matcher.is_match(e.file_name()))
        .map(|e| {
            let label = dataset_label(&e.file_name().to_string_lossy());
            DatasetEntry {
                path: e.into_path(),
                label,
            }
        })
        .collect();

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(dir = %dir.display(), count = entries.len(), "discovered datasets");
    Ok(entries)
}

/// `"product-models-250.json"` becomes `"250 rows"`; other names are kept.
pub fn dataset_label(file_name: &str) -> String {
    file_name
        .strip_prefix("product-models-")
        .and_then(|rest| rest.strip_suffix(".json"))
        .filter(|count| !count.is_empty() && count.chars().all(|c| c.is_ascii_digit()))
        .map(|count| format!("{} rows", count))
        .unwrap_or_else(|| file_name.to_string())
}

/// Index of the preferred dataset, falling back to the first one.
pub fn default_dataset(entries: &[DatasetEntry]) -> Option<usize> {
    if entries.is_empty() {
        return None;
    }
    Some(
        entries
            .iter()
            .position(|e| e.label == PREFERRED_DATASET_LABEL)
            .unwrap_or(0),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::make_simple_tree;

    #[test]
    fn test_dataset_label() {
        assert_eq!(dataset_label("product-models-1000.json"), "1000 rows");
        assert_eq!(dataset_label("product-models-.json"), "product-models-.json");
        assert_eq!(dataset_label("product-models-big.json"), "product-models-big.json");
        assert_eq!(dataset_label("catalog.json"), "catalog.json");
    }

    #[test]
    fn test_default_dataset_prefers_1000_rows() {
        let entry = |label: &str| DatasetEntry {
            path: PathBuf::from(label),
            label: label.to_string(),
        };
        assert_eq!(default_dataset(&[]), None);
        assert_eq!(default_dataset(&[entry("10 rows"), entry("50 rows")]), Some(0));
        assert_eq!(
            default_dataset(&[entry("10 rows"), entry("1000 rows")]),
            Some(1)
        );
    }

    #[test]
    fn test_discover_datasets_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("product-models-50.json"), "[]").unwrap();
        fs::write(dir.path().join("product-models-10.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("more")).unwrap();
        fs::write(dir.path().join("more/product-models-7.json"), "[]").unwrap();

        let found = discover_datasets(dir.path(), DEFAULT_DATASET_GLOB).unwrap();
        let labels: Vec<&str> = found.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["7 rows", "10 rows", "50 rows"]);
    }

    #[test]
    fn test_discover_datasets_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_datasets(&dir.path().join("nope"), DEFAULT_DATASET_GLOB).is_err());
    }

    #[test]
    fn test_file_source_reads_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        fs::write(&path, serde_json::to_string(&make_simple_tree()).unwrap()).unwrap();

        let source = DataSource::File(path.clone());
        assert_eq!(source.fetch().unwrap(), make_simple_tree());
        assert_eq!(source.file_path(), Some(path.as_path()));
    }

    #[test]
    fn test_file_source_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = DataSource::File(dir.path().join("missing.json"));
        assert!(missing.fetch().unwrap_err().is_transport());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{\"not\": \"rows\"}").unwrap();
        assert!(matches!(
            DataSource::File(bad).fetch(),
            Err(TreeError::Decode(_))
        ));
    }

    #[test]
    fn test_http_source_url() {
        let source = DataSource::Http {
            base_url: "https://pim.example.com/".to_string(),
            scope: TreeScope::Model,
            technical_id: "42".to_string(),
        };
        assert_eq!(
            source.to_string(),
            "https://pim.example.com/enrich/product-model/rest/tree"
        );
        assert_eq!(source.file_path(), None);
    }
}
