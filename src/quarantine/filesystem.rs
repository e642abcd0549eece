//! Filesystem-based quarantine storage implementation.

use crate::audit;
use crate::core::error::QuarantineError;
use crate::core::FileDigest;
use crate::quarantine::record::{QuarantineEntry, QuarantineId, RestorePolicy};
use crate::quarantine::traits::QuarantineStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Filesystem-based quarantine storage.
///
/// Files are moved under an id-derived name so they cannot be run by
/// accident and same-named files never collide. The directory is read on
/// every call, so several processes (or restarts) see the same entries.
///
/// # Directory Structure
///
/// ```text
/// quarantine/
/// ├── data/
/// │   └── {id}.qdata          # Quarantined file
/// └── meta/
///     └── {id}.json           # Sidecar manifest
/// ```
#[derive(Debug, Clone)]
pub struct FilesystemQuarantine {
    base_path: PathBuf,
    restore_dir: PathBuf,
    restore_policy: RestorePolicy,
}

impl FilesystemQuarantine {
    /// Creates a new filesystem quarantine at the given path.
    ///
    /// Creates the directory structure if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, QuarantineError> {
        let store = Self {
            base_path: base_path.into(),
            restore_dir: PathBuf::from("."),
            restore_policy: RestorePolicy::default(),
        };
        store.ensure_dirs_sync()?;
        Ok(store)
    }

    /// Sets the directory used when restoring into a directory.
    pub fn with_restore_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.restore_dir = dir.into();
        self
    }

    /// Sets the restore policy.
    pub fn with_restore_policy(mut self, policy: RestorePolicy) -> Self {
        self.restore_policy = policy;
        self
    }

    /// Returns the quarantine root.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the path to the quarantine data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.base_path.join("data")
    }

    /// Returns the path to the quarantine metadata directory.
    pub fn meta_dir(&self) -> PathBuf {
        self.base_path.join("meta")
    }

    fn data_path(&self, id: &QuarantineId) -> PathBuf {
        self.data_dir().join(format!("{}.qdata", id.as_str()))
    }

    fn meta_path(&self, id: &QuarantineId) -> PathBuf {
        self.meta_dir().join(format!("{}.json", id.as_str()))
    }

    fn ensure_dirs_sync(&self) -> Result<(), QuarantineError> {
        for dir in [self.data_dir(), self.meta_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| QuarantineError::StoreFailed {
                reason: format!("Failed to create {}: {}", dir.display(), e),
            })?;
        }
        Ok(())
    }

    async fn ensure_dirs(&self) -> Result<(), QuarantineError> {
        for dir in [self.data_dir(), self.meta_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| QuarantineError::StoreFailed {
                    reason: format!("Failed to create {}: {}", dir.display(), e),
                })?;
        }
        Ok(())
    }

    async fn write_manifest(&self, entry: &QuarantineEntry) -> Result<(), QuarantineError> {
        let content =
            serde_json::to_vec_pretty(entry).map_err(|e| QuarantineError::Manifest {
                id: entry.id.to_string(),
                reason: e.to_string(),
            })?;

        tokio::fs::write(self.meta_path(&entry.id), content)
            .await
            .map_err(|e| QuarantineError::Manifest {
                id: entry.id.to_string(),
                reason: e.to_string(),
            })
    }

    /// Reads a sidecar; a missing or unreadable one yields `None`.
    async fn read_manifest(&self, id: &QuarantineId) -> Option<QuarantineEntry> {
        let content = match tokio::fs::read(self.meta_path(id)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(quarantine_id = %id, error = %e, "Manifest unreadable");
                return None;
            }
        };

        match serde_json::from_slice::<QuarantineEntry>(&content) {
            Ok(entry) if entry.id == *id => Some(entry),
            Ok(_) => {
                tracing::warn!(quarantine_id = %id, "Manifest id mismatch");
                None
            }
            Err(e) => {
                tracing::warn!(quarantine_id = %id, error = %e, "Manifest corrupt");
                None
            }
        }
    }

    /// Builds an entry for a data file, with or without its manifest.
    async fn load_entry(&self, id: QuarantineId, data: &std::fs::Metadata) -> QuarantineEntry {
        if let Some(entry) = self.read_manifest(&id).await {
            return entry;
        }

        let quarantined_at = data
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        QuarantineEntry {
            id,
            original_name: None,
            original_path: None,
            digest: None,
            size: data.len(),
            quarantined_at,
        }
    }

    async fn require_data(&self, id: &QuarantineId) -> Result<PathBuf, QuarantineError> {
        let path = self.data_path(id);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(path),
            Ok(false) => Err(QuarantineError::NotFound { id: id.to_string() }),
            Err(e) => Err(QuarantineError::Io(e)),
        }
    }

    /// Entries without a manifest restore into `restore_dir` under their id.
    fn restore_destination(&self, entry: &QuarantineEntry) -> PathBuf {
        let name = entry
            .original_name
            .clone()
            .unwrap_or_else(|| entry.id.to_string());

        match (self.restore_policy, entry.original_path.clone()) {
            (RestorePolicy::OriginalLocation, Some(original)) => original,
            _ => self.restore_dir.join(name),
        }
    }
}

/// Renames a file, falling back to copy-then-remove across devices.
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if tokio::fs::copy(from, to).await.is_err() {
                return Err(rename_err);
            }
            if let Err(e) = tokio::fs::remove_file(from).await {
                let _ = tokio::fs::remove_file(to).await;
                return Err(e);
            }
            Ok(())
        }
    }
}

async fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[async_trait]
impl QuarantineStore for FilesystemQuarantine {
    async fn quarantine(
        &self,
        path: &Path,
        digest: &FileDigest,
    ) -> Result<QuarantineEntry, QuarantineError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| QuarantineError::StoreFailed {
                reason: format!("Failed to stat {}: {}", path.display(), e),
            })?;
        if !metadata.is_file() {
            return Err(QuarantineError::StoreFailed {
                reason: format!("{} is not a regular file", path.display()),
            });
        }

        self.ensure_dirs().await?;

        let original = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());
        let entry = QuarantineEntry::new(&original, digest.clone(), metadata.len());

        self.write_manifest(&entry).await?;

        if let Err(e) = move_file(path, &self.data_path(&entry.id)).await {
            let _ = remove_if_present(&self.meta_path(&entry.id)).await;
            return Err(QuarantineError::StoreFailed {
                reason: format!("Failed to move {}: {}", path.display(), e),
            });
        }

        tracing::info!(
            quarantine_id = %entry.id,
            file = %original.display(),
            digest = %digest,
            "File quarantined"
        );
        audit::emit_quarantine_event(&entry, "quarantine");

        Ok(entry)
    }

    async fn list(&self) -> Result<Vec<QuarantineEntry>, QuarantineError> {
        let mut dir = match tokio::fs::read_dir(self.data_dir()).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(QuarantineError::Io(e)),
        };

        let mut entries = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|s| s.to_str()) != Some("qdata") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(QuarantineId::parse)
            else {
                tracing::debug!(file = %path.display(), "Ignoring foreign file in quarantine");
                continue;
            };

            let metadata = item.metadata().await?;
            entries.push(self.load_entry(id, &metadata).await);
        }

        entries.sort_by(|a, b| b.quarantined_at.cmp(&a.quarantined_at));
        Ok(entries)
    }

    async fn restore(&self, id: &QuarantineId) -> Result<PathBuf, QuarantineError> {
        let data_path = self.require_data(id).await?;
        let entry = self.load_entry(id.clone(), &tokio::fs::metadata(&data_path).await?).await;
        let destination = self.restore_destination(&entry);

        if tokio::fs::try_exists(&destination).await? {
            return Err(QuarantineError::DestinationExists { path: destination });
        }

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| QuarantineError::RestoreFailed {
                    reason: format!("Failed to create {}: {}", parent.display(), e),
                })?;
        }

        move_file(&data_path, &destination)
            .await
            .map_err(|e| QuarantineError::RestoreFailed {
                reason: format!("Failed to move to {}: {}", destination.display(), e),
            })?;

        if let Err(e) = remove_if_present(&self.meta_path(id)).await {
            tracing::warn!(quarantine_id = %id, error = %e, "Stale manifest left behind");
        }

        tracing::info!(
            quarantine_id = %id,
            destination = %destination.display(),
            "File restored from quarantine"
        );
        audit::emit_quarantine_event(&entry, "restore");

        Ok(destination)
    }

    async fn purge(&self, id: &QuarantineId) -> Result<(), QuarantineError> {
        let data_path = self.require_data(id).await?;
        let entry = self.load_entry(id.clone(), &tokio::fs::metadata(&data_path).await?).await;

        tokio::fs::remove_file(&data_path).await?;
        remove_if_present(&self.meta_path(id)).await?;

        tracing::info!(quarantine_id = %id, "Quarantined file purged");
        audit::emit_quarantine_event(&entry, "purge");

        Ok(())
    }
}
