//! Per-scan state and background scan handles.

use crate::core::{ScanError, ThreatRecord};
use crate::manager::stop::StopSignal;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// State of one in-flight scan, shared by its workers.
///
/// Files are handed out through an atomic cursor, so each file is claimed
/// by exactly one worker.
#[derive(Debug)]
pub struct ScanSession {
    target: PathBuf,
    files: Vec<PathBuf>,
    cursor: AtomicUsize,
    processed: AtomicUsize,
    started_at: Instant,
}

impl ScanSession {
    /// Creates a session over the resolved file list.
    pub fn new(target: PathBuf, files: Vec<PathBuf>, started_at: Instant) -> Self {
        Self {
            target,
            files,
            cursor: AtomicUsize::new(0),
            processed: AtomicUsize::new(0),
            started_at,
        }
    }

    /// Claims the next unprocessed file with its 1-based index.
    pub fn claim(&self) -> Option<(usize, &Path)> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        let path = self.files.get(index)?;
        self.processed.fetch_add(1, Ordering::Relaxed);
        Some((index + 1, path))
    }

    /// The requested target.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Number of files found by traversal.
    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    /// Number of files claimed so far.
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    /// Time since the scan started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Handle to a scan running on its own task.
#[derive(Debug)]
pub struct ScanTask {
    stop: StopSignal,
    handle: JoinHandle<Vec<ThreatRecord>>,
}

impl ScanTask {
    pub(crate) fn new(stop: StopSignal, handle: JoinHandle<Vec<ThreatRecord>>) -> Self {
        Self { stop, handle }
    }

    /// Requests a cooperative stop.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// The stop signal driving this scan.
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Returns `true` once the scan task has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the scan and returns its threat records.
    pub async fn join(self) -> Result<Vec<ThreatRecord>, ScanError> {
        self.handle
            .await
            .map_err(|e| ScanError::internal(format!("Scan task failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_hands_out_each_file_once() {
        let files = vec![PathBuf::from("a"), PathBuf::from("b")];
        let session = ScanSession::new("root".into(), files, Instant::now());

        assert_eq!(session.claim(), Some((1, Path::new("a"))));
        assert_eq!(session.claim(), Some((2, Path::new("b"))));
        assert_eq!(session.claim(), None);
        assert_eq!(session.claim(), None);
        assert_eq!(session.processed(), 2);
        assert_eq!(session.total_files(), 2);
    }
}
