//! Audit event types and emission functions.

use crate::core::{Decision, ScanSummary, ScanTermination, ThreatRecord};
use crate::quarantine::QuarantineEntry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit event for a finalized threat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// The flagged file.
    pub file_path: String,

    /// Content digest.
    pub digest: String,

    /// Detection tier (`local` or `remote`).
    pub source: String,

    /// Remote malicious count, if any.
    pub malicious: Option<u32>,

    /// Remote suspicious count, if any.
    pub suspicious: Option<u32>,

    /// The decision taken.
    pub decision: Decision,

    /// Whether the decision's filesystem action succeeded.
    pub action_applied: bool,
}

impl From<&ThreatRecord> for ThreatAuditEvent {
    fn from(record: &ThreatRecord) -> Self {
        Self {
            timestamp: record.detected_at,
            file_path: record.file_path.display().to_string(),
            digest: record.digest.to_string(),
            source: record.source.to_string(),
            malicious: record.malicious,
            suspicious: record.suspicious,
            decision: record.decision,
            action_applied: record.action_applied,
        }
    }
}

impl AuditEvent for ThreatAuditEvent {
    fn event_type(&self) -> &'static str {
        "threat_detected"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Audit event for a finished scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// The scan target.
    pub target: String,

    /// Files found by traversal.
    pub total_files: usize,

    /// Files processed.
    pub processed: usize,

    /// Threat records produced.
    pub threats: usize,

    /// Scan duration in milliseconds.
    pub duration_ms: u64,

    /// `completed`, `stopped` or `aborted`.
    pub status: String,

    /// Abort reason, if aborted.
    pub reason: Option<String>,
}

impl From<&ScanSummary> for ScanAuditEvent {
    fn from(summary: &ScanSummary) -> Self {
        let (status, reason) = match &summary.termination {
            ScanTermination::Completed => ("completed", None),
            ScanTermination::Stopped => ("stopped", None),
            ScanTermination::Aborted(reason) => ("aborted", Some(reason.to_string())),
        };
        Self {
            timestamp: Utc::now(),
            target: summary.target.display().to_string(),
            total_files: summary.total_files,
            processed: summary.processed,
            threats: summary.threats,
            duration_ms: summary.elapsed.as_millis() as u64,
            status: status.to_string(),
            reason,
        }
    }
}

impl AuditEvent for ScanAuditEvent {
    fn event_type(&self) -> &'static str {
        "scan_completed"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Emits an audit event for a scan starting.
pub fn emit_scan_started(target: &Path, total_files: usize, workers: usize) {
    tracing::info!(
        target: "hashguard::audit",
        event_type = "scan_started",
        scan_target = %target.display(),
        total_files,
        workers,
        "Scan started"
    );
}

/// Emits an audit event for a threat after its decision was applied.
pub fn emit_threat(record: &ThreatRecord) {
    let event = ThreatAuditEvent::from(record);
    tracing::warn!(
        target: "hashguard::audit",
        event_type = event.event_type(),
        file = %event.file_path,
        digest = %event.digest,
        source = %event.source,
        malicious = ?event.malicious,
        suspicious = ?event.suspicious,
        decision = %event.decision,
        action_applied = event.action_applied,
        "Threat detected"
    );
}

/// Emits an audit event for a finished, stopped or aborted scan.
pub fn emit_scan_completed(summary: &ScanSummary) {
    let event = ScanAuditEvent::from(summary);
    tracing::info!(
        target: "hashguard::audit",
        event_type = event.event_type(),
        scan_target = %event.target,
        total_files = event.total_files,
        processed = event.processed,
        threats = event.threats,
        duration_ms = event.duration_ms,
        status = %event.status,
        reason = ?event.reason,
        "Scan finished"
    );
}

/// Emits an audit event for a quarantine operation.
pub fn emit_quarantine_event(entry: &QuarantineEntry, operation: &str) {
    tracing::info!(
        target: "hashguard::audit",
        event_type = "quarantine_operation",
        quarantine_id = %entry.id,
        operation = %operation,
        digest = ?entry.digest.as_ref().map(|d| d.as_str()),
        original_path = ?entry.original_path,
        file_size = entry.size,
        "Quarantine operation performed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AbortReason, FileHasher, Verdict};
    use std::time::Duration;

    #[test]
    fn test_threat_event_from_record() {
        let digest = FileHasher::new().digest_bytes(b"x");
        let record = ThreatRecord::new(
            "/tmp/x",
            digest.clone(),
            Verdict::RemoteMatch {
                malicious: 3,
                suspicious: 1,
            },
            Decision::Quarantine,
            true,
        )
        .unwrap();

        let event = ThreatAuditEvent::from(&record);
        assert_eq!(event.event_type(), "threat_detected");
        assert_eq!(event.source, "remote");
        assert_eq!(event.digest, digest.as_str());
        assert_eq!(event.malicious, Some(3));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["decision"], "quarantine");
    }

    #[test]
    fn test_scan_event_from_aborted_summary() {
        let summary = ScanSummary {
            target: "/nowhere".into(),
            total_files: 0,
            processed: 0,
            threats: 0,
            elapsed: Duration::from_millis(5),
            termination: ScanTermination::Aborted(AbortReason::NoSignatures),
        };

        let event = ScanAuditEvent::from(&summary);
        assert_eq!(event.status, "aborted");
        assert_eq!(event.reason.as_deref(), Some("no valid signatures loaded"));
        assert_eq!(event.duration_ms, 5);
    }
}
