//! Structured audit logging.
//!
//! This module provides functions for emitting structured audit events
//! using the `tracing` crate on the `hashguard::audit` target. Events can
//! be captured by any tracing subscriber (JSON file, journald, etc.).

mod events;

pub use events::{
    emit_quarantine_event, emit_scan_completed, emit_scan_started, emit_threat, AuditEvent,
    ScanAuditEvent, ThreatAuditEvent,
};
