// crates/attribution-server/src/audit.rs
// ============================================================================
// Module: Server Audit Logging
// Description: Structured audit events for registrations and reports.
// Purpose: Emit JSON-line audit records without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every registration request and every inbound report produces one audit
//! event. Events carry counts and error labels only; key pieces, debug keys
//! and payload contents are never logged. Sinks are swappable so deployments
//! can route events to stderr, a file, or nowhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome label shared by audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Registration header emitted.
    Registered,
    /// Request served without a registration header.
    Skipped,
    /// Debug report decoded and stored.
    Stored,
    /// Non-debug report accepted without storage.
    Acknowledged,
    /// Request rejected.
    Rejected,
}

/// Registration audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Route that handled the request.
    pub route: &'static str,
    /// Registration kind (`source` or `trigger`).
    pub kind: &'static str,
    /// Request outcome.
    pub outcome: AuditOutcome,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
}

impl RegistrationAuditEvent {
    /// Creates a registration audit event stamped with the current time.
    #[must_use]
    pub fn new(
        route: &'static str,
        kind: &'static str,
        outcome: AuditOutcome,
        error_kind: Option<&'static str>,
    ) -> Self {
        Self {
            event: "registration_audit",
            timestamp_ms: now_ms(),
            route,
            kind,
            outcome,
            error_kind,
        }
    }
}

/// Report audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ReportAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Whether the report arrived on the debug endpoint.
    pub debug: bool,
    /// Request outcome.
    pub outcome: AuditOutcome,
    /// Report identifier from `shared_info` when available.
    pub report_id: Option<String>,
    /// Payloads received.
    pub payload_count: usize,
    /// Payloads kept undecoded.
    pub undecoded_count: usize,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
}

/// Inputs required to construct a report audit event.
pub struct ReportAuditEventParams {
    /// Whether the report arrived on the debug endpoint.
    pub debug: bool,
    /// Request outcome.
    pub outcome: AuditOutcome,
    /// Report identifier when available.
    pub report_id: Option<String>,
    /// Payloads received.
    pub payload_count: usize,
    /// Payloads kept undecoded.
    pub undecoded_count: usize,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
}

impl ReportAuditEvent {
    /// Creates a report audit event stamped with the current time.
    #[must_use]
    pub fn new(params: ReportAuditEventParams) -> Self {
        Self {
            event: "report_audit",
            timestamp_ms: now_ms(),
            debug: params.debug,
            outcome: params.outcome,
            report_id: params.report_id,
            payload_count: params.payload_count,
            undecoded_count: params.undecoded_count,
            request_bytes: params.request_bytes,
            error_kind: params.error_kind,
        }
    }
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for server events.
pub trait AuditSink: Send + Sync {
    /// Record a registration audit event.
    fn record_registration(&self, event: &RegistrationAuditEvent);

    /// Record a report audit event.
    fn record_report(&self, event: &ReportAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record_registration(&self, event: &RegistrationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }

    fn record_report(&self, event: &ReportAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes one serialized line.
    fn write_line(&self, payload: &str) {
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record_registration(&self, event: &RegistrationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }

    fn record_report(&self, event: &ReportAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            self.write_line(&payload);
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record_registration(&self, _event: &RegistrationAuditEvent) {}

    fn record_report(&self, _event: &ReportAuditEvent) {}
}
