//! Core types used throughout the hashguard library.
//!
//! This module defines the digest newtype, per-file verdicts, threat
//! decisions and the records handed back to the caller of a scan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Length of a hex-encoded MD5 digest.
pub const DIGEST_HEX_LEN: usize = 32;

/// Returns `true` if `candidate` is exactly 32 lowercase hexadecimal characters.
pub fn is_digest_hex(candidate: &str) -> bool {
    candidate.len() == DIGEST_HEX_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Hex-encoded MD5 digest of a file's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileDigest(String);

impl FileDigest {
    /// Parses a digest, accepting only 32 lowercase hex characters.
    pub fn parse(candidate: &str) -> Option<Self> {
        is_digest_hex(candidate).then(|| Self(candidate.to_string()))
    }

    /// Wraps a string produced by the hasher, which is always well formed.
    pub(crate) fn from_hex_unchecked(hex: String) -> Self {
        debug_assert!(is_digest_hex(&hex));
        Self(hex)
    }

    /// Returns the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FileDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which detection tier flagged a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatSource {
    /// Matched the local signature set.
    Local,
    /// Flagged by the remote reputation service.
    Remote,
}

impl ThreatSource {
    /// Human-facing label shown in a decision prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Remote => "VirusTotal",
        }
    }
}

impl fmt::Display for ThreatSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Classification of a single file after local and remote checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Verdict {
    /// No detection.
    Clean,
    /// The digest is in the local signature set.
    LocalMatch,
    /// The reputation service reported at least one detection.
    RemoteMatch {
        /// Engines flagging the file as malicious.
        malicious: u32,
        /// Engines flagging the file as suspicious.
        suspicious: u32,
    },
    /// The remote lookup failed and the engine is configured to fail closed.
    LookupFailed,
}

impl Verdict {
    /// Returns `true` if no decision is needed.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Builds a verdict from remote counts; zero detections are clean.
    pub fn from_counts(malicious: u32, suspicious: u32) -> Self {
        if malicious > 0 || suspicious > 0 {
            Self::RemoteMatch {
                malicious,
                suspicious,
            }
        } else {
            Self::Clean
        }
    }

    /// The detection tier, or `None` for a clean verdict.
    pub fn source(&self) -> Option<ThreatSource> {
        match self {
            Self::Clean => None,
            Self::LocalMatch => Some(ThreatSource::Local),
            Self::RemoteMatch { .. } | Self::LookupFailed => Some(ThreatSource::Remote),
        }
    }
}

/// Action chosen for a confirmed threat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Remove the file from disk.
    Delete,
    /// Move the file into the quarantine store.
    Quarantine,
    /// Leave the file where it is.
    #[default]
    Ignore,
}

impl Decision {
    /// Returns `true` if the decision touches the filesystem.
    pub fn is_destructive(&self) -> bool {
        !matches!(self, Self::Ignore)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "delete"),
            Self::Quarantine => write!(f, "quarantine"),
            Self::Ignore => write!(f, "ignore"),
        }
    }
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delete" | "d" | "1" => Ok(Self::Delete),
            "quarantine" | "q" | "2" => Ok(Self::Quarantine),
            "ignore" | "i" | "3" | "" => Ok(Self::Ignore),
            other => Err(format!("unknown decision '{other}'")),
        }
    }
}

/// What the decision-maker is asked about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatPrompt {
    /// The flagged file.
    pub file_path: PathBuf,
    /// Its digest.
    pub digest: FileDigest,
    /// The detection tier.
    pub source: ThreatSource,
    /// The full verdict, for decision-makers that weigh detection counts.
    pub verdict: Verdict,
}

impl ThreatPrompt {
    /// Label describing where the detection came from.
    pub fn source_label(&self) -> &'static str {
        self.source.label()
    }
}

/// A finished detection, handed to the caller of a scan.
///
/// Records are immutable once built. `action_applied` reports whether the
/// filesystem side of the decision succeeded; it never changes `decision`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatRecord {
    /// The flagged file.
    pub file_path: PathBuf,
    /// Its digest.
    pub digest: FileDigest,
    /// Which tier flagged it.
    pub source: ThreatSource,
    /// Malicious engine count, for remote detections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub malicious: Option<u32>,
    /// Suspicious engine count, for remote detections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspicious: Option<u32>,
    /// The decision that was made.
    pub decision: Decision,
    /// Whether the delete or quarantine step succeeded.
    pub action_applied: bool,
    /// When the detection was finalized.
    pub detected_at: DateTime<Utc>,
}

impl ThreatRecord {
    /// Builds a record for a non-clean verdict. Returns `None` for `Clean`.
    pub fn new(
        file_path: impl Into<PathBuf>,
        digest: FileDigest,
        verdict: Verdict,
        decision: Decision,
        action_applied: bool,
    ) -> Option<Self> {
        let source = verdict.source()?;
        let (malicious, suspicious) = match verdict {
            Verdict::RemoteMatch {
                malicious,
                suspicious,
            } => (Some(malicious), Some(suspicious)),
            _ => (None, None),
        };
        Some(Self {
            file_path: file_path.into(),
            digest,
            source,
            malicious,
            suspicious,
            decision,
            action_applied,
            detected_at: Utc::now(),
        })
    }
}

/// Why a scan stopped before looking at any file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    /// The signature set was empty.
    NoSignatures,
    /// The target path is neither a file nor a directory.
    InvalidTarget {
        /// The rejected path.
        path: PathBuf,
    },
    /// Walking the target tree failed unexpectedly.
    TraversalFailed {
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSignatures => write!(f, "no valid signatures loaded"),
            Self::InvalidTarget { path } => {
                write!(f, "{} is neither a file nor a directory", path.display())
            }
            Self::TraversalFailed { reason } => write!(f, "directory walk failed: {reason}"),
        }
    }
}

/// How a scan ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanTermination {
    /// Every file was processed.
    Completed,
    /// A stop was requested before all files were processed.
    Stopped,
    /// The scan never started.
    Aborted(AbortReason),
}

/// Payload of the completion event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// The requested target.
    pub target: PathBuf,
    /// Files found by traversal.
    pub total_files: usize,
    /// Files for which processing started.
    pub processed: usize,
    /// Number of threat records produced.
    pub threats: usize,
    /// Wall-clock time of the scan.
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    /// How the scan ended.
    pub termination: ScanTermination,
}

impl ScanSummary {
    /// Returns `true` if the scan ran to the end.
    pub fn is_complete(&self) -> bool {
        matches!(self.termination, ScanTermination::Completed)
    }
}

/// Serde helper for Duration serialization.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
