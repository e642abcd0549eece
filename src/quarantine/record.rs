//! Quarantine entry types.

use crate::core::FileDigest;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Unique identifier for a quarantined file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuarantineId(String);

impl QuarantineId {
    /// Creates a new random quarantine ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parses an ID, accepting only the UUID form the store generates.
    ///
    /// Anything else could name a path outside the quarantine directory.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim())
            .ok()
            .map(|uuid| Self(uuid.hyphenated().to_string()))
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for QuarantineId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QuarantineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata about a quarantined file.
///
/// Written as the JSON sidecar `meta/{id}.json`. An entry listed from a
/// data file whose sidecar is missing has no original name, path or digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineEntry {
    /// Unique identifier for this entry.
    pub id: QuarantineId,

    /// Base name the file had before it was quarantined.
    pub original_name: Option<String>,

    /// Absolute path the file was moved from.
    pub original_path: Option<PathBuf>,

    /// Digest of the file content.
    pub digest: Option<FileDigest>,

    /// Size of the file in bytes.
    pub size: u64,

    /// When the file was quarantined.
    pub quarantined_at: DateTime<Utc>,
}

impl QuarantineEntry {
    /// Creates an entry for a file about to be moved into quarantine.
    pub fn new(original_path: &Path, digest: FileDigest, size: u64) -> Self {
        Self {
            id: QuarantineId::new(),
            original_name: original_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            original_path: Some(original_path.to_path_buf()),
            digest: Some(digest),
            size,
            quarantined_at: Utc::now(),
        }
    }

    /// Name shown to users: the original base name, or the id.
    pub fn display_name(&self) -> &str {
        self.original_name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Where `restore` puts a file back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorePolicy {
    /// Back to the recorded original path; the restore directory is used
    /// when the original path is unknown.
    #[default]
    OriginalLocation,

    /// Always into the restore directory, under the original base name.
    Directory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FileHasher;

    #[test]
    fn test_quarantine_id() {
        let id1 = QuarantineId::new();
        let id2 = QuarantineId::new();
        assert_ne!(id1, id2);

        let parsed = QuarantineId::parse(id1.as_str()).unwrap();
        assert_eq!(parsed, id1);
    }

    #[test]
    fn test_quarantine_id_rejects_paths() {
        assert!(QuarantineId::parse("../../etc/passwd").is_none());
        assert!(QuarantineId::parse("").is_none());
    }

    #[test]
    fn test_entry_records_original_name() {
        let digest = FileHasher::new().digest_bytes(b"x");
        let entry = QuarantineEntry::new(Path::new("/tmp/dir/sample.exe"), digest, 1);

        assert_eq!(entry.original_name.as_deref(), Some("sample.exe"));
        assert_eq!(entry.display_name(), "sample.exe");
        assert_eq!(entry.size, 1);
    }

    #[test]
    fn test_restore_policy_serde() {
        let policy: RestorePolicy = serde_json::from_str("\"directory\"").unwrap();
        assert_eq!(policy, RestorePolicy::Directory);
        assert_eq!(RestorePolicy::default(), RestorePolicy::OriginalLocation);
    }
}
