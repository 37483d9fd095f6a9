use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};

pub enum WatchEvent {
    DatasetChanged,
    Error(String),
}

/// Watches a dataset file and signals when its contents change.
pub struct DatasetWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl DatasetWatcher {
    /// Watch `path`. Bursts of writes within `debounce_duration` collapse
    /// into a single `DatasetChanged`.
    pub fn new(
        path: &Path,
        debounce_duration: Duration,
    ) -> anyhow::Result<(Self, mpsc::Receiver<WatchEvent>)> {
        let (tx, rx) = mpsc::channel();

        let target = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        // Editors often replace files by rename, so watch the directory.
        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let watched = target.clone();
        let mut debouncer = new_debouncer(debounce_duration, move |res: DebounceEventResult| {
            match res {
                Ok(events) => {
                    if events.iter().any(|event| event.path == watched) {
                        let _ = tx.send(WatchEvent::DatasetChanged);
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatchEvent::Error(format!("{:?}", e)));
                }
            }
        })?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)?;

        Ok((
            Self {
                _debouncer: debouncer,
            },
            rx,
        ))
    }
}
