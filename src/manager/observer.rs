//! Scan progress observers.

use crate::core::{ScanSummary, ThreatRecord};

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Receives live events from a running scan.
///
/// Methods are called from worker tasks, possibly concurrently, and must
/// not block for long. Each file's progress event precedes its threat
/// event; there is no ordering across files. `on_complete` is called
/// exactly once per scan, including aborted and stopped scans.
pub trait ScanObserver: Send + Sync {
    /// A worker started on file `index` of `total` (1-based).
    fn on_progress(&self, index: usize, total: usize, path: &Path) {
        let _ = (index, total, path);
    }

    /// A threat was finalized.
    fn on_threat(&self, record: &ThreatRecord) {
        let _ = record;
    }

    /// The scan is over.
    fn on_complete(&self, summary: &ScanSummary) {
        let _ = summary;
    }
}

/// An observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Adapts a progress closure into an observer.
pub struct FnObserver<F> {
    on_progress: F,
}

impl<F> FnObserver<F>
where
    F: Fn(usize, usize, &Path) + Send + Sync,
{
    /// Wraps a progress callback.
    pub fn new(on_progress: F) -> Self {
        Self { on_progress }
    }
}

impl<F> fmt::Debug for FnObserver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnObserver").finish_non_exhaustive()
    }
}

impl<F> ScanObserver for FnObserver<F>
where
    F: Fn(usize, usize, &Path) + Send + Sync,
{
    fn on_progress(&self, index: usize, total: usize, path: &Path) {
        (self.on_progress)(index, total, path)
    }
}

/// An event forwarded by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    /// Progress on one file.
    Progress {
        /// 1-based index of the file.
        index: usize,
        /// Total number of files.
        total: usize,
        /// The file.
        path: PathBuf,
    },
    /// A finalized threat.
    Threat(ThreatRecord),
    /// The scan is over.
    Complete(ScanSummary),
}

/// Forwards events over an unbounded channel.
///
/// Sends never block; events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ChannelObserver {
    /// Creates an observer and the receiver for its events.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ScanEvent) {
        let _ = self.tx.send(event);
    }
}

impl ScanObserver for ChannelObserver {
    fn on_progress(&self, index: usize, total: usize, path: &Path) {
        self.send(ScanEvent::Progress {
            index,
            total,
            path: path.to_path_buf(),
        });
    }

    fn on_threat(&self, record: &ThreatRecord) {
        self.send(ScanEvent::Threat(record.clone()));
    }

    fn on_complete(&self, summary: &ScanSummary) {
        self.send(ScanEvent::Complete(summary.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ScanTermination;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_fn_observer_forwards_progress() {
        let calls = AtomicUsize::new(0);
        let observer = FnObserver::new(|index, total, _path: &Path| {
            assert!(index <= total);
            calls.fetch_add(1, Ordering::SeqCst);
        });

        observer.on_progress(1, 2, Path::new("a"));
        observer.on_progress(2, 2, Path::new("b"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_channel_observer_forwards_events() {
        let (observer, mut rx) = ChannelObserver::new();
        observer.on_progress(1, 1, Path::new("/tmp/a"));
        observer.on_complete(&ScanSummary {
            target: "/tmp".into(),
            total_files: 1,
            processed: 1,
            threats: 0,
            elapsed: Duration::ZERO,
            termination: ScanTermination::Completed,
        });

        assert!(matches!(rx.try_recv(), Ok(ScanEvent::Progress { index: 1, .. })));
        assert!(matches!(rx.try_recv(), Ok(ScanEvent::Complete(_))));
        assert!(rx.try_recv().is_err());
    }
}
