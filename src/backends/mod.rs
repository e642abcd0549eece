//! Reputation service backends.
//!
//! This module contains implementations of the `ReputationLookup` trait.
//!
//! ## Available Backends
//!
//! - [`mock`] - An in-memory lookup for tests and offline runs
//! - [`virustotal`] - VirusTotal REST API (requires `virustotal` feature)

pub mod mock;

#[cfg(feature = "virustotal")]
pub mod virustotal;

pub use mock::MockReputation;

#[cfg(feature = "virustotal")]
pub use virustotal::{VirusTotalClient, VirusTotalConfig};
