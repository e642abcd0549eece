//! Quarantine storage for detected files.
//!
//! This module provides a trait-based abstraction for quarantine storage,
//! allowing flagged files to be isolated, listed, restored and purged.

mod filesystem;
mod record;
mod traits;

pub use filesystem::FilesystemQuarantine;
pub use record::{QuarantineEntry, QuarantineId, RestorePolicy};
pub use traits::QuarantineStore;
