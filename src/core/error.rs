//! Error types for the hashguard library.
//!
//! Per-file failures, quarantine failures and configuration failures each
//! get their own typed error. The library never panics; every failure is
//! returned as a `Result` value and the scan loop decides whether it is
//! fatal for the batch or only for a single file.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for scan operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// File not found at the specified path.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// The file could not be opened because of missing permissions.
    #[error("permission denied: {path}")]
    PermissionDenied {
        /// Path that could not be opened.
        path: PathBuf,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to reach the reputation service.
    #[error("connection to '{engine}' failed: {message}")]
    ConnectionFailed {
        /// Name of the remote service.
        engine: String,
        /// Error message describing the failure.
        message: String,
    },

    /// A remote operation did not finish in time.
    #[error("'{engine}' timed out after {elapsed:?}")]
    Timeout {
        /// Name of the remote service.
        engine: String,
        /// How long the operation ran before giving up.
        elapsed: Duration,
    },

    /// The service returned an unexpected status or an unparseable body.
    #[error("ambiguous response from '{engine}': {details}")]
    AmbiguousResponse {
        /// Name of the remote service.
        engine: String,
        /// Details about the ambiguity.
        details: String,
    },

    /// Rate limit exceeded for the service.
    #[error("rate limit exceeded for '{engine}': retry after {retry_after:?}")]
    RateLimited {
        /// Name of the remote service.
        engine: String,
        /// Suggested wait time before retry.
        retry_after: Option<Duration>,
    },

    /// The credential was rejected.
    #[error("authentication failed for '{engine}': {reason}")]
    AuthenticationFailed {
        /// Name of the remote service.
        engine: String,
        /// Reason for authentication failure.
        reason: String,
    },

    /// An internal error occurred.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl ScanError {
    /// Returns `true` if this error is transient (a later attempt may succeed).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::ConnectionFailed { .. } | Self::RateLimited { .. }
        )
    }

    /// Returns `true` if the error only concerns a single file.
    ///
    /// The orchestrator skips the file and keeps going for these.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. } | Self::PermissionDenied { .. } | Self::Io(_)
        )
    }

    /// Maps an I/O error raised while opening `path` to the matching variant.
    pub fn from_open(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound { path: path.into() },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: path.into() },
            _ => Self::Io(err),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(engine: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            engine: engine.into(),
            elapsed,
        }
    }

    /// Creates a `ConnectionFailed` error.
    pub fn connection_failed(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            engine: engine.into(),
            message: message.into(),
        }
    }

    /// Creates an `AmbiguousResponse` error.
    pub fn ambiguous(engine: impl Into<String>, details: impl Into<String>) -> Self {
        Self::AmbiguousResponse {
            engine: engine.into(),
            details: details.into(),
        }
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Error type for quarantine operations.
#[derive(Debug, Error)]
pub enum QuarantineError {
    /// No entry with this id exists in the quarantine directory.
    #[error("quarantine entry not found: {id}")]
    NotFound {
        /// The quarantine id that was not found.
        id: String,
    },

    /// Restoring would overwrite an existing file.
    #[error("restore destination already exists: {path}")]
    DestinationExists {
        /// The destination that is already occupied.
        path: PathBuf,
    },

    /// Failed to move a file into quarantine.
    #[error("failed to store file in quarantine: {reason}")]
    StoreFailed {
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to move a file out of quarantine.
    #[error("failed to restore file from quarantine: {reason}")]
    RestoreFailed {
        /// Reason for the failure.
        reason: String,
    },

    /// The sidecar manifest could not be read or written.
    #[error("quarantine manifest error for {id}: {reason}")]
    Manifest {
        /// Entry whose manifest is broken.
        id: String,
        /// Reason for the failure.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type for loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("failed to read settings from {path}: {source}")]
    Read {
        /// Settings file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid YAML for the settings schema.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of range or inconsistent.
    #[error("invalid setting '{field}': {reason}")]
    Invalid {
        /// Offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_is_recoverable() {
        let timeout = ScanError::timeout("virustotal", Duration::from_secs(30));
        assert!(timeout.is_recoverable());

        let internal = ScanError::internal("hashing task failed");
        assert!(!internal.is_recoverable());
        assert!(!internal.is_per_file());
    }

    #[test]
    fn test_from_open_maps_kinds() {
        let err = ScanError::from_open(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::FileNotFound { .. }));
        assert!(err.is_per_file());

        let err = ScanError::from_open(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::from_open("/tmp/x", std::io::Error::other("disk"));
        assert!(matches!(err, ScanError::Io(_)));
    }

    #[test]
    fn test_quarantine_error_display() {
        let err = QuarantineError::NotFound { id: "abc".into() };
        assert_eq!(err.to_string(), "quarantine entry not found: abc");
    }
}
