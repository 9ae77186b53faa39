//! File system watcher for hot-reloading the schema snapshot and the
//! template catalog.
//!
//! The parent directory of each watched file is watched non-recursively, so
//! editors that save by writing a new file and renaming it over the old one
//! are still noticed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use kgqa_core::error::KgqaError;

/// Reports changes to a fixed set of files.
pub struct ResourceWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::Receiver<PathBuf>,
}

impl ResourceWatcher {
    /// Start watching `files`, which must exist.
    ///
    /// # Errors
    ///
    /// Returns [`KgqaError::Io`] if a file cannot be resolved or the
    /// watcher cannot be created.
    pub fn start(files: &[&Path]) -> Result<Self, KgqaError> {
        let (tx, rx) = mpsc::channel();

        let mut targets = Vec::with_capacity(files.len());
        let mut dirs = BTreeSet::new();
        for file in files {
            let canonical = file.canonicalize()?;
            if let Some(dir) = canonical.parent() {
                dirs.insert(dir.to_path_buf());
            }
            targets.push(canonical);
        }

        let watched = targets.clone();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            for path in &event.paths {
                if watched.contains(path) {
                    let _ = tx.send(path.clone());
                }
            }
        })
        .map_err(|e| KgqaError::Io(std::io::Error::other(e)))?;

        for dir in &dirs {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|e| KgqaError::Io(std::io::Error::other(e)))?;
        }
        tracing::debug!(files = ?targets, "watching for changes");

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Wait up to `timeout` for the next change.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<PathBuf> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Every file changed since the last call, without blocking.
    pub fn drain(&self) -> BTreeSet<PathBuf> {
        self.receiver.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn detects_change_to_watched_file() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("kg_schema.json");
        fs::write(&schema, "{}").unwrap();

        let watcher = ResourceWatcher::start(&[schema.as_path()]).unwrap();
        fs::write(&schema, r#"{"entities":["周杰伦"]}"#).unwrap();

        let changed = watcher.recv_timeout(Duration::from_secs(2));
        assert!(changed.is_some(), "expected a change event");
        assert_eq!(
            changed.unwrap().file_name().and_then(|n| n.to_str()),
            Some("kg_schema.json")
        );
    }

    #[test]
    fn ignores_other_files_in_the_same_directory() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("kg_schema.json");
        fs::write(&schema, "{}").unwrap();

        let watcher = ResourceWatcher::start(&[schema.as_path()]).unwrap();
        fs::write(dir.path().join("notes.txt"), "unrelated").unwrap();

        assert!(watcher.recv_timeout(Duration::from_millis(500)).is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(ResourceWatcher::start(&[missing.as_path()]).is_err());
    }
}
