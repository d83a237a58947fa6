// crates/attribution-server/src/lib.rs
// ============================================================================
// Module: Attribution Server Library
// Description: HTTP surface for attribution registrations and reports.
// Purpose: Expose the server, routes, and audit sinks.
// Dependencies: attribution-config, attribution-core, axum, tokio
// ============================================================================

//! ## Overview
//! The server answers registration requests with key-piece headers and
//! ingests aggregatable reports into the shared report store. All key
//! encoding and report decoding is delegated to `attribution-core`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod routes;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditOutcome;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RegistrationAuditEvent;
pub use audit::ReportAuditEvent;
pub use audit::StderrAuditSink;
pub use routes::DEBUG_REPORT_PATH;
pub use routes::ELIGIBLE_HEADER;
pub use routes::REGISTER_SOURCE_HEADER;
pub use routes::REGISTER_TRIGGER_HEADER;
pub use routes::REPORT_PATH;
pub use server::ServerError;
pub use server::SspServer;
