//! Core traits for the hashguard library.
//!
//! This module defines the `ReputationLookup` trait that every remote
//! verdict backend implements, along with the outcome it reports.

use crate::core::types::{FileDigest, Verdict};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;

/// What the reputation service knows about a digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// The service has an analysis for this digest.
    Known {
        /// Engines flagging the file as malicious.
        malicious: u32,
        /// Engines flagging the file as suspicious.
        suspicious: u32,
    },
    /// The service has never seen this digest and it was not submitted.
    Unknown,
    /// No verdict is available right now.
    TransientFailure {
        /// Human-readable cause, for logs.
        reason: String,
    },
}

impl LookupOutcome {
    /// Creates a `TransientFailure` outcome.
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::TransientFailure {
            reason: reason.into(),
        }
    }

    /// Converts the outcome into a verdict, if it carries one.
    ///
    /// `Unknown` maps to `Clean`; `TransientFailure` returns `None` so the
    /// caller can apply its failure policy.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Self::Known {
                malicious,
                suspicious,
            } => Some(Verdict::from_counts(*malicious, *suspicious)),
            Self::Unknown => Some(Verdict::Clean),
            Self::TransientFailure { .. } => None,
        }
    }
}

/// A remote multi-engine verdict service addressed by file digest.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; one instance is shared by all
///   scan workers.
/// - Never return an error: network, status and parse failures are
///   reported as [`LookupOutcome::TransientFailure`].
/// - `path` is provided so implementations can submit unknown files for
///   analysis; it may be ignored.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use hashguard::core::{FileDigest, LookupOutcome, ReputationLookup};
/// use async_trait::async_trait;
/// use std::path::Path;
///
/// #[derive(Debug)]
/// struct AlwaysClean;
///
/// #[async_trait]
/// impl ReputationLookup for AlwaysClean {
///     fn name(&self) -> &str {
///         "always-clean"
///     }
///
///     async fn lookup(&self, _digest: &FileDigest, _path: Option<&Path>) -> LookupOutcome {
///         LookupOutcome::Known { malicious: 0, suspicious: 0 }
///     }
/// }
/// ```
#[async_trait]
pub trait ReputationLookup: Send + Sync + Debug {
    /// Stable identifier of the service, e.g. `"virustotal"`.
    fn name(&self) -> &str;

    /// Looks up a digest.
    async fn lookup(&self, digest: &FileDigest, path: Option<&Path>) -> LookupOutcome;
}

/// An arc-wrapped lookup for shared ownership.
pub type ArcReputation = std::sync::Arc<dyn ReputationLookup>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_to_verdict() {
        let known = LookupOutcome::Known {
            malicious: 0,
            suspicious: 2,
        };
        assert_eq!(
            known.verdict(),
            Some(Verdict::RemoteMatch {
                malicious: 0,
                suspicious: 2
            })
        );
        assert_eq!(LookupOutcome::Unknown.verdict(), Some(Verdict::Clean));
        assert_eq!(LookupOutcome::transient("timeout").verdict(), None);
    }
}
