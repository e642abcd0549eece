//! Cooperative stop flag shared by a scan and its workers.

use std::sync::Arc;
use tokio::sync::watch;

/// A clonable, one-way stop flag.
///
/// Once stopped it stays stopped. Workers poll [`is_stopped`] between
/// files; long waits race against [`stopped`].
///
/// [`is_stopped`]: StopSignal::is_stopped
/// [`stopped`]: StopSignal::stopped
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    /// Creates a signal that has not been stopped.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Requests a stop. Idempotent.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    /// Returns `true` once a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves when a stop is requested (immediately if it already was).
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stop_is_shared_between_clones() {
        let signal = StopSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_stopped());

        signal.stop();
        signal.stop();
        assert!(clone.is_stopped());

        tokio::time::timeout(Duration::from_secs(1), clone.stopped())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stopped_wakes_waiter() {
        let signal = StopSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.stopped().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        signal.stop();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
