//! Download capture
//!
//! WebDriver has no download-completed event, so export capture is
//! filesystem-based: snapshot the download directory before triggering the
//! export, then poll until a new, fully-written file appears. Chrome's
//! in-progress `.crdownload` markers (and generic `.tmp` files) are skipped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::core::{Result, TrackexError};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Watches a download directory for one new file
pub struct DownloadWatcher {
    dir: PathBuf,
    before: HashSet<PathBuf>,
}

impl DownloadWatcher {
    /// Snapshot the directory contents before the download is triggered.
    ///
    /// Creates the directory if it does not exist yet.
    pub fn begin(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let before = list_entries(&dir)?;
        Ok(Self { dir, before })
    }

    /// Wait until a new file finishes downloading, returning its path.
    ///
    /// A file counts as finished once it is not an in-progress marker and its
    /// size is stable across two consecutive polls.
    pub async fn wait_for_file(&self, timeout: Duration) -> Result<PathBuf> {
        let deadline = Instant::now() + timeout;
        let mut last_size: Option<(PathBuf, u64)> = None;

        while Instant::now() < deadline {
            for path in list_entries(&self.dir)? {
                if self.before.contains(&path) || is_in_progress(&path) {
                    continue;
                }
                let size = std::fs::metadata(&path)?.len();
                match &last_size {
                    Some((prev_path, prev_size)) if *prev_path == path && *prev_size == size => {
                        debug!(path = %path.display(), size, "download complete");
                        return Ok(path);
                    }
                    _ => {
                        last_size = Some((path, size));
                    }
                }
            }
            sleep(POLL_INTERVAL).await;
        }

        Err(TrackexError::DownloadTimeout(timeout.as_secs()))
    }
}

fn list_entries(dir: &Path) -> Result<HashSet<PathBuf>> {
    let mut entries = HashSet::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            entries.insert(entry.path());
        }
    }
    Ok(entries)
}

fn is_in_progress(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("crdownload") | Some("tmp") | Some("part")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_detects_new_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.csv"), b"old").unwrap();

        let watcher = DownloadWatcher::begin(dir.path()).unwrap();

        let target = dir.path().join("export.csv");
        let write_path = target.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(300)).await;
            std::fs::write(&write_path, b"asin,rank\nB001,3\n").unwrap();
        });

        let found = watcher.wait_for_file(Duration::from_secs(5)).await.unwrap();
        assert_eq!(found, target);
    }

    #[tokio::test]
    async fn test_ignores_preexisting_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("already-there.csv"), b"x").unwrap();

        let watcher = DownloadWatcher::begin(dir.path()).unwrap();
        let result = watcher.wait_for_file(Duration::from_secs(1)).await;
        assert!(matches!(result, Err(TrackexError::DownloadTimeout(_))));
    }

    #[tokio::test]
    async fn test_skips_in_progress_markers() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = DownloadWatcher::begin(dir.path()).unwrap();

        let partial = dir.path().join("export.csv.crdownload");
        let complete = dir.path().join("export.csv");
        tokio::spawn(async move {
            std::fs::write(&partial, b"partial").unwrap();
            sleep(Duration::from_millis(400)).await;
            std::fs::rename(&partial, &complete).unwrap();
        });

        let found = watcher.wait_for_file(Duration::from_secs(5)).await.unwrap();
        assert_eq!(found.extension().unwrap(), "csv");
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("downloads");
        let watcher = DownloadWatcher::begin(&nested).unwrap();
        assert!(nested.is_dir());
        assert!(watcher.before.is_empty());
    }
}
