//! Core types and traits for the hashguard library.
//!
//! - [`types`] - Digests, verdicts, decisions and threat records
//! - [`traits`] - The `ReputationLookup` trait
//! - [`error`] - Structured error types
//! - [`hasher`] - Streaming MD5 file hashing

pub mod error;
pub mod hasher;
pub mod traits;
pub mod types;

pub use error::{ConfigError, QuarantineError, ScanError};
pub use hasher::FileHasher;
pub use traits::{ArcReputation, LookupOutcome, ReputationLookup};
pub use types::{
    is_digest_hex, AbortReason, Decision, FileDigest, ScanSummary, ScanTermination,
    ThreatPrompt, ThreatRecord, ThreatSource, Verdict,
};
