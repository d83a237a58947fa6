// crates/attribution-core/src/lib.rs
// ============================================================================
// Module: Attribution Core Library
// Description: Public API surface for the attribution core.
// Purpose: Expose key codec types, report store interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Attribution core packs advertising attributes into 128-bit aggregation key
//! pieces, recovers them from report buckets, and ingests aggregatable debug
//! reports into an append-only store. It performs no network I/O; the server
//! and CLI crates drive it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ReportStore;
pub use interfaces::StoreError;
pub use runtime::IdGenerator;
pub use runtime::InMemoryReportStore;
pub use runtime::IngestError;
pub use runtime::IngestPolicy;
pub use runtime::PayloadError;
pub use runtime::RegistrationBuilder;
pub use runtime::ReportIngestor;
pub use runtime::SharedReportStore;
pub use runtime::SourceRequest;
pub use runtime::TriggerRequest;
