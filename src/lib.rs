//! # Hashguard
//!
//! A hash-based malware scanning engine with local signatures, remote
//! reputation lookups, an interactive decision workflow and quarantine.
//!
//! ## Overview
//!
//! Hashguard walks a file or directory tree and, for every file:
//!
//! - Computes the MD5 digest of its content in fixed-size blocks
//! - Checks the digest against a local signature set
//! - Otherwise asks a reputation service (VirusTotal) for a verdict
//! - Asks a decision-maker what to do with each threat
//! - Deletes, quarantines or ignores the file accordingly
//! - Reports live progress and a final summary to an observer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hashguard::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = ScanManager::builder()
//!         .with_reputation(MockReputation::new())
//!         .with_quarantine(FilesystemQuarantine::new("./quarantine")?)
//!         .build()?;
//!
//!     let signatures = Arc::new(SignatureSet::load("Hashes.txt"));
//!     let records = manager
//!         .scan(
//!             "./downloads",
//!             signatures,
//!             Arc::new(NoopObserver),
//!             &DecisionGateway::fixed(Decision::Quarantine),
//!         )
//!         .await;
//!
//!     for record in &records {
//!         println!("{} ({})", record.file_path.display(), record.source);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes the VirusTotal backend
//! - `virustotal` - VirusTotal v3 API reputation backend
//!
//! ## Architecture
//!
//! - **Core**: Digests, verdicts, decisions, records and error types
//! - **Signatures**: The local set of known-bad digests
//! - **Backends**: Reputation service implementations
//! - **Manager**: Traversal, worker pool and per-file pipeline
//! - **Gateway**: Decision requests between workers and a decision-maker
//! - **Quarantine**: Isolation of flagged files
//! - **Audit**: Structured audit events
//! - **Config**: YAML settings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod config;
pub mod core;
pub mod gateway;
pub mod manager;
pub mod quarantine;
pub mod signatures;

// Re-export commonly used types at the crate root
pub use crate::core::{
    Decision, FileDigest, FileHasher, LookupOutcome, ReputationLookup, ScanError, ScanSummary,
    ThreatRecord, ThreatSource, Verdict,
};

pub use crate::config::Settings;
pub use crate::gateway::{DecisionGateway, DecisionInbox};
pub use crate::manager::{ScanManager, ScanManagerConfig, ScanObserver, StopSignal};
pub use crate::quarantine::{FilesystemQuarantine, QuarantineStore};
pub use crate::signatures::SignatureSet;

/// Prelude module for convenient imports.
///
/// ```rust
/// use hashguard::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backends::MockReputation;
    pub use crate::config::Settings;
    pub use crate::core::{
        Decision, FileDigest, FileHasher, LookupOutcome, QuarantineError, ReputationLookup,
        ScanError, ScanSummary, ScanTermination, ThreatPrompt, ThreatRecord, ThreatSource,
        Verdict,
    };
    pub use crate::gateway::{DecisionGateway, DecisionInbox, DecisionRequest};
    pub use crate::manager::{
        ChannelObserver, FnObserver, NoopObserver, RemoteFailurePolicy, ScanEvent, ScanManager,
        ScanManagerConfig, ScanObserver, ScanTask, StopSignal,
    };
    pub use crate::quarantine::{
        FilesystemQuarantine, QuarantineEntry, QuarantineId, QuarantineStore, RestorePolicy,
    };
    pub use crate::signatures::SignatureSet;
}
