// crates/attribution-core/src/core/report.rs
// ============================================================================
// Module: Aggregatable Reports
// Description: Wire and decoded forms of aggregatable reports.
// Purpose: Separate untrusted inbound shapes from fully decoded stored reports.
// Dependencies: serde, serde_json, crate::core::{fields, key_piece}
// ============================================================================

//! ## Overview
//! [`RawAggregatableReport`] mirrors the JSON body posted by the browser.
//! [`DebugReport`] is the decoded form retained for audit: `shared_info` is
//! parsed, every cleartext payload is either decoded into entries or kept in
//! its original encoded text alongside the failure reason. Top-level members
//! the decoder does not model are carried through in `extra`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::fields::DecodedBucket;
use crate::core::key_piece::KeyPiece;

// ============================================================================
// SECTION: Inbound Shapes
// ============================================================================

/// Aggregatable report body as posted by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAggregatableReport {
    /// JSON-encoded shared metadata.
    pub shared_info: String,
    /// Encrypted and (in debug mode) cleartext payloads.
    #[serde(default)]
    pub aggregation_service_payloads: Vec<RawServicePayload>,
    /// Source debug key when debug mode is enabled.
    #[serde(default)]
    pub source_debug_key: Option<String>,
    /// Trigger debug key when debug mode is enabled.
    #[serde(default)]
    pub trigger_debug_key: Option<String>,
    /// Any other top-level members, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One aggregation-service payload as posted by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawServicePayload {
    /// Encrypted payload (opaque).
    #[serde(default)]
    pub payload: Option<String>,
    /// Encryption key identifier.
    #[serde(default)]
    pub key_id: Option<String>,
    /// Base64 CBOR cleartext, present only on debug reports.
    #[serde(default)]
    pub debug_cleartext_payload: Option<String>,
}

// ============================================================================
// SECTION: Decoded Report
// ============================================================================

/// Fully decoded debug report.
///
/// # Invariants
/// - Built once by the ingestor and never mutated after it is stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugReport {
    /// Parsed shared metadata.
    pub shared_info: Map<String, Value>,
    /// Payloads in arrival order.
    pub aggregation_service_payloads: Vec<IngestedPayload>,
    /// Source debug key when present.
    pub source_debug_key: Option<String>,
    /// Trigger debug key when present.
    pub trigger_debug_key: Option<String>,
    /// Unrecognized top-level members of the posted body.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DebugReport {
    /// Returns `shared_info.report_id` when it is a string.
    #[must_use]
    pub fn report_id(&self) -> Option<&str> {
        self.shared_info.get("report_id").and_then(Value::as_str)
    }

    /// Counts payloads whose cleartext could not be decoded.
    #[must_use]
    pub fn undecoded_count(&self) -> usize {
        self.aggregation_service_payloads
            .iter()
            .filter(|payload| {
                matches!(payload.debug_cleartext_payload, CleartextPayload::Undecoded { .. })
            })
            .count()
    }
}

/// One payload after cleartext decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestedPayload {
    /// Encrypted payload, passed through unchanged.
    pub payload: Option<String>,
    /// Encryption key identifier.
    pub key_id: Option<String>,
    /// Decoded cleartext or the undecodable original.
    pub debug_cleartext_payload: CleartextPayload,
}

/// Outcome of decoding one cleartext payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleartextPayload {
    /// Payload decoded into entries.
    Decoded {
        /// Entries in CBOR stream order.
        entries: Vec<PayloadEntry>,
    },
    /// Payload kept in its original form.
    Undecoded {
        /// Original base64 text, when one was supplied.
        encoded: Option<String>,
        /// Failure reason.
        error: String,
    },
}

/// One decoded operation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadEntry {
    /// Aggregation operation label (for example `histogram`).
    pub operation: String,
    /// Contributions in payload order.
    pub data: Vec<Contribution>,
}

/// One bucket/value contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contribution {
    /// Contribution value from a 4-byte big-endian field.
    pub value: u32,
    /// Raw bucket.
    pub bucket: KeyPiece,
    /// Bucket decoded into key fields.
    pub decoded: DecodedBucket,
}

/// Non-debug report accepted without decoding or storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcknowledgedReport {
    /// Parsed shared metadata.
    pub shared_info: Map<String, Value>,
    /// Number of opaque payloads received.
    pub payload_count: usize,
}
