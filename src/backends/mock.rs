//! Mock reputation service for testing.
//!
//! This module provides a configurable in-memory lookup that can be used
//! in tests and offline runs to simulate remote verdicts without network
//! access.

use crate::core::{FileDigest, LookupOutcome, ReputationLookup};

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

/// A mock reputation service.
///
/// Responses are keyed by digest; unknown digests get the default outcome.
///
/// # Examples
///
/// ```rust
/// use hashguard::backends::MockReputation;
/// use hashguard::core::LookupOutcome;
///
/// let service = MockReputation::new()
///     .with_response(
///         "5eb63bbbe01eeed093cb22bb8f5acdc3",
///         LookupOutcome::Known { malicious: 3, suspicious: 0 },
///     );
/// assert_eq!(service.lookup_count(), 0);
/// ```
#[derive(Debug)]
pub struct MockReputation {
    name: String,
    responses: RwLock<HashMap<String, LookupOutcome>>,
    default_outcome: LookupOutcome,
    latency: Option<Duration>,
    lookup_count: AtomicU64,
    looked_up: Mutex<Vec<FileDigest>>,
}

impl MockReputation {
    /// Creates a mock that reports every digest as unknown.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            responses: RwLock::new(HashMap::new()),
            default_outcome: LookupOutcome::Unknown,
            latency: None,
            lookup_count: AtomicU64::new(0),
            looked_up: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock whose lookups always fail transiently.
    pub fn new_unavailable() -> Self {
        Self::new().with_default_outcome(LookupOutcome::transient("mock service unavailable"))
    }

    /// Sets the name of this service.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the outcome for digests without a configured response.
    pub fn with_default_outcome(mut self, outcome: LookupOutcome) -> Self {
        self.default_outcome = outcome;
        self
    }

    /// Adds a response for a specific digest.
    pub fn with_response(self, digest: impl Into<String>, outcome: LookupOutcome) -> Self {
        self.add_response(digest, outcome);
        self
    }

    /// Sets a simulated per-lookup latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Adds a response for a specific digest (shared-reference version).
    pub fn add_response(&self, digest: impl Into<String>, outcome: LookupOutcome) {
        self.responses
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(digest.into(), outcome);
    }

    /// Returns the number of lookups performed.
    pub fn lookup_count(&self) -> u64 {
        self.lookup_count.load(Ordering::Relaxed)
    }

    /// Returns every digest asked about, in call order.
    pub fn looked_up(&self) -> Vec<FileDigest> {
        self.looked_up
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for MockReputation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReputationLookup for MockReputation {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, digest: &FileDigest, _path: Option<&Path>) -> LookupOutcome {
        self.lookup_count.fetch_add(1, Ordering::Relaxed);
        self.looked_up
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(digest.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.responses
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(digest.as_str())
            .cloned()
            .unwrap_or_else(|| self.default_outcome.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FileHasher;

    #[tokio::test]
    async fn test_mock_default_unknown() {
        let service = MockReputation::new();
        let digest = FileHasher::new().digest_bytes(b"anything");

        assert_eq!(service.lookup(&digest, None).await, LookupOutcome::Unknown);
        assert_eq!(service.lookup_count(), 1);
        assert_eq!(service.looked_up(), vec![digest]);
    }

    #[tokio::test]
    async fn test_mock_custom_response() {
        let digest = FileHasher::new().digest_bytes(b"bad");
        let service = MockReputation::new().with_response(
            digest.as_str(),
            LookupOutcome::Known {
                malicious: 3,
                suspicious: 0,
            },
        );

        let outcome = service.lookup(&digest, None).await;
        assert_eq!(
            outcome,
            LookupOutcome::Known {
                malicious: 3,
                suspicious: 0
            }
        );

        let other = FileHasher::new().digest_bytes(b"good");
        assert_eq!(service.lookup(&other, None).await, LookupOutcome::Unknown);
        assert_eq!(service.lookup_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let service = MockReputation::new_unavailable().with_name("down");
        let digest = FileHasher::new().digest_bytes(b"x");

        assert_eq!(service.name(), "down");
        assert!(matches!(
            service.lookup(&digest, None).await,
            LookupOutcome::TransientFailure { .. }
        ));
    }
}
