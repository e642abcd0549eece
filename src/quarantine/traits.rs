//! Quarantine store trait definition.

use crate::core::error::QuarantineError;
use crate::core::FileDigest;
use crate::quarantine::record::{QuarantineEntry, QuarantineId};

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Trait for quarantine storage implementations.
///
/// A store isolates files away from their original location and can later
/// put them back or destroy them. None of its failures are fatal to a scan.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use hashguard::quarantine::{QuarantineStore, QuarantineEntry, QuarantineId};
/// use hashguard::core::{FileDigest, QuarantineError};
/// use async_trait::async_trait;
/// use std::path::{Path, PathBuf};
///
/// #[derive(Debug)]
/// struct MyQuarantineStore;
///
/// #[async_trait]
/// impl QuarantineStore for MyQuarantineStore {
///     async fn quarantine(&self, path: &Path, digest: &FileDigest)
///         -> Result<QuarantineEntry, QuarantineError> { todo!() }
///     async fn list(&self) -> Result<Vec<QuarantineEntry>, QuarantineError> { todo!() }
///     async fn restore(&self, id: &QuarantineId) -> Result<PathBuf, QuarantineError> { todo!() }
///     async fn purge(&self, id: &QuarantineId) -> Result<(), QuarantineError> { todo!() }
/// }
/// ```
#[async_trait]
pub trait QuarantineStore: Send + Sync + Debug {
    /// Moves a file into quarantine.
    ///
    /// On success the file no longer exists at `path`.
    async fn quarantine(
        &self,
        path: &Path,
        digest: &FileDigest,
    ) -> Result<QuarantineEntry, QuarantineError>;

    /// Lists current entries, newest first.
    async fn list(&self) -> Result<Vec<QuarantineEntry>, QuarantineError>;

    /// Moves a file back out of quarantine and returns where it landed.
    async fn restore(&self, id: &QuarantineId) -> Result<PathBuf, QuarantineError>;

    /// Permanently deletes a quarantined file.
    async fn purge(&self, id: &QuarantineId) -> Result<(), QuarantineError>;

    /// Returns the number of quarantined files.
    async fn count(&self) -> Result<usize, QuarantineError> {
        Ok(self.list().await?.len())
    }

    /// Checks if a file with the given digest is already quarantined.
    async fn contains_digest(&self, digest: &FileDigest) -> Result<bool, QuarantineError> {
        let entries = self.list().await?;
        Ok(entries.iter().any(|e| e.digest.as_ref() == Some(digest)))
    }
}
