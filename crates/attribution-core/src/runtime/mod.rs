// crates/attribution-core/src/runtime/mod.rs
// ============================================================================
// Module: Attribution Runtime
// Description: Key codec, identifier generation, registration and ingestion.
// Purpose: Execute the encode, decode and report pipelines over core types.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the key-piece codec, registration building and
//! report ingestion. Every HTTP route and CLI command calls into the same
//! functions so encoding stays identical across surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod codec;
pub mod ids;
pub mod ingest;
pub mod registration;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use codec::decode;
pub use codec::decode_bucket;
pub use codec::decode_source;
pub use codec::decode_trigger;
pub use codec::encode;
pub use codec::encode_source;
pub use codec::encode_trigger;
pub use ids::IdGenerator;
pub use ingest::DEFAULT_MAX_CLEARTEXT_BYTES;
pub use ingest::DEFAULT_MAX_PAYLOADS;
pub use ingest::IngestError;
pub use ingest::IngestPolicy;
pub use ingest::PayloadError;
pub use ingest::ReportIngestor;
pub use registration::DEFAULT_DESTINATION_TEMPLATE;
pub use registration::RegistrationBuilder;
pub use registration::SourceRequest;
pub use registration::TriggerRequest;
pub use store::InMemoryReportStore;
pub use store::SharedReportStore;
