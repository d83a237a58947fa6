// crates/attribution-core/src/runtime/ingest.rs
// ============================================================================
// Module: Report Ingestion
// Description: Decodes aggregatable debug reports and stores them.
// Purpose: Turn untrusted report bodies into fully decoded, audit-ready records.
// Dependencies: base64, serde_cbor, serde_json, thiserror, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Ingestion runs in a fixed order: parse `shared_info`, enforce the payload
//! limit, decode each cleartext payload, then append. A report is decoded in
//! full before it reaches the store.
//!
//! Payload failures are local. A payload whose cleartext cannot be decoded is
//! kept verbatim with a reason and the rest of the report is still stored.
//! Only a malformed envelope rejects the whole report.
//!
//! Security posture: report bodies are untrusted. Cleartext size and payload
//! count are bounded by [`IngestPolicy`] and byte-length fields must match
//! exactly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_cbor::Value as CborValue;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::AcknowledgedReport;
use crate::core::BucketLayout;
use crate::core::CleartextPayload;
use crate::core::Contribution;
use crate::core::DebugReport;
use crate::core::IngestedPayload;
use crate::core::KEY_PIECE_BYTES;
use crate::core::KeyPiece;
use crate::core::PayloadEntry;
use crate::core::RawAggregatableReport;
use crate::core::RawServicePayload;
use crate::interfaces::ReportStore;
use crate::interfaces::StoreError;
use crate::runtime::codec::decode_bucket;
use crate::runtime::store::SharedReportStore;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default maximum payloads accepted per report.
pub const DEFAULT_MAX_PAYLOADS: usize = 64;
/// Default maximum base64 cleartext length per payload.
pub const DEFAULT_MAX_CLEARTEXT_BYTES: usize = 64 * 1024;
/// Byte length of a contribution value.
const VALUE_BYTES: usize = 4;

/// Ingestion policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestPolicy {
    /// Layout used for operations other than `histogram`.
    pub default_layout: BucketLayout,
    /// Maximum payloads per report.
    pub max_payloads: usize,
    /// Maximum base64 cleartext length per payload.
    pub max_cleartext_bytes: usize,
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self {
            default_layout: BucketLayout::Combined,
            max_payloads: DEFAULT_MAX_PAYLOADS,
            max_cleartext_bytes: DEFAULT_MAX_CLEARTEXT_BYTES,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Report-level ingestion errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Report envelope is unusable.
    #[error("malformed report: {0}")]
    MalformedReport(String),
    /// Store rejected the report.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Payload-level decode errors, recorded on the payload and never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// No cleartext was supplied.
    #[error("debug cleartext payload missing")]
    MissingCleartext,
    /// Cleartext exceeds the configured limit.
    #[error("cleartext length {actual} exceeds limit {limit}")]
    Oversize {
        /// Configured limit.
        limit: usize,
        /// Observed length.
        actual: usize,
    },
    /// Cleartext is not valid base64.
    #[error("invalid base64: {0}")]
    Base64(String),
    /// Cleartext is not valid CBOR.
    #[error("invalid cbor: {0}")]
    Cbor(String),
    /// CBOR item has the wrong structure.
    #[error("unexpected payload shape: {0}")]
    Shape(String),
    /// A byte field has the wrong length.
    #[error("{field} must be {expected} bytes, got {actual}")]
    ByteLength {
        /// Field name.
        field: &'static str,
        /// Required length.
        expected: usize,
        /// Observed length.
        actual: usize,
    },
}

// ============================================================================
// SECTION: Ingestor
// ============================================================================

/// Decodes reports and appends them to a shared store.
#[derive(Clone, Default)]
pub struct ReportIngestor {
    /// Destination store.
    store: SharedReportStore,
    /// Decode limits and layout defaults.
    policy: IngestPolicy,
}

impl ReportIngestor {
    /// Creates an ingestor over `store`.
    #[must_use]
    pub const fn new(store: SharedReportStore, policy: IngestPolicy) -> Self {
        Self {
            store,
            policy,
        }
    }

    /// Decodes and stores a debug report, returning the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MalformedReport`] when `shared_info` is not a
    /// JSON object or the payload limit is exceeded, and
    /// [`IngestError::Store`] when the append fails.
    pub fn ingest(&self, raw: RawAggregatableReport) -> Result<DebugReport, IngestError> {
        let report = self.decode(raw)?;
        self.store.append(report.clone())?;
        Ok(report)
    }

    /// Parses a JSON body and ingests it.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MalformedReport`] when the body is not a report.
    pub fn ingest_json(&self, body: &[u8]) -> Result<DebugReport, IngestError> {
        self.ingest(parse_body(body)?)
    }

    /// Decodes a debug report without storing it.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MalformedReport`] for an unusable envelope.
    pub fn decode(&self, raw: RawAggregatableReport) -> Result<DebugReport, IngestError> {
        let shared_info = parse_shared_info(&raw.shared_info)?;
        self.check_payload_count(raw.aggregation_service_payloads.len())?;
        let aggregation_service_payloads = raw
            .aggregation_service_payloads
            .into_iter()
            .map(|payload| self.decode_payload(payload))
            .collect();
        Ok(DebugReport {
            shared_info,
            aggregation_service_payloads,
            source_debug_key: raw.source_debug_key,
            trigger_debug_key: raw.trigger_debug_key,
            extra: raw.extra,
        })
    }

    /// Accepts a non-debug report without decoding payloads or storing it.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MalformedReport`] for an unusable envelope.
    pub fn acknowledge(
        &self,
        raw: &RawAggregatableReport,
    ) -> Result<AcknowledgedReport, IngestError> {
        let shared_info = parse_shared_info(&raw.shared_info)?;
        let payload_count = raw.aggregation_service_payloads.len();
        self.check_payload_count(payload_count)?;
        Ok(AcknowledgedReport {
            shared_info,
            payload_count,
        })
    }

    /// Parses a JSON body and acknowledges it.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MalformedReport`] when the body is not a report.
    pub fn acknowledge_json(&self, body: &[u8]) -> Result<AcknowledgedReport, IngestError> {
        self.acknowledge(&parse_body(body)?)
    }

    /// Returns a snapshot of stored reports.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Store`] when the snapshot fails.
    pub fn reports(&self) -> Result<Vec<DebugReport>, IngestError> {
        Ok(self.store.list()?)
    }

    /// Rejects reports carrying more payloads than the policy allows.
    fn check_payload_count(&self, count: usize) -> Result<(), IngestError> {
        if count > self.policy.max_payloads {
            return Err(IngestError::MalformedReport(format!(
                "{count} payloads exceeds limit {}",
                self.policy.max_payloads
            )));
        }
        Ok(())
    }

    /// Decodes one payload, keeping the original text on failure.
    fn decode_payload(&self, raw: RawServicePayload) -> IngestedPayload {
        let cleartext = match self.decode_cleartext(raw.debug_cleartext_payload.as_deref()) {
            Ok(entries) => CleartextPayload::Decoded {
                entries,
            },
            Err(err) => CleartextPayload::Undecoded {
                encoded: raw.debug_cleartext_payload,
                error: err.to_string(),
            },
        };
        IngestedPayload {
            payload: raw.payload,
            key_id: raw.key_id,
            debug_cleartext_payload: cleartext,
        }
    }

    /// Runs base64 then CBOR decoding over one cleartext.
    fn decode_cleartext(&self, encoded: Option<&str>) -> Result<Vec<PayloadEntry>, PayloadError> {
        let encoded = encoded.ok_or(PayloadError::MissingCleartext)?;
        if encoded.len() > self.policy.max_cleartext_bytes {
            return Err(PayloadError::Oversize {
                limit: self.policy.max_cleartext_bytes,
                actual: encoded.len(),
            });
        }
        let bytes =
            STANDARD.decode(encoded.trim()).map_err(|err| PayloadError::Base64(err.to_string()))?;
        let mut entries = Vec::new();
        for item in serde_cbor::Deserializer::from_slice(&bytes).into_iter::<CborValue>() {
            let item = item.map_err(|err| PayloadError::Cbor(err.to_string()))?;
            entries.push(self.decode_entry(&item)?);
        }
        Ok(entries)
    }

    /// Decodes one `{operation, data}` map.
    fn decode_entry(&self, item: &CborValue) -> Result<PayloadEntry, PayloadError> {
        let operation = match map_field(item, "operation")? {
            CborValue::Text(text) => text.clone(),
            _ => return Err(PayloadError::Shape("operation must be text".to_string())),
        };
        let CborValue::Array(items) = map_field(item, "data")? else {
            return Err(PayloadError::Shape("data must be an array".to_string()));
        };
        let layout = BucketLayout::for_operation(&operation, self.policy.default_layout);
        let data = items
            .iter()
            .map(|contribution| decode_contribution(contribution, layout))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PayloadEntry {
            operation,
            data,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a report body.
fn parse_body(body: &[u8]) -> Result<RawAggregatableReport, IngestError> {
    serde_json::from_slice(body).map_err(|err| IngestError::MalformedReport(err.to_string()))
}

/// Parses the JSON-encoded `shared_info` string into an object.
fn parse_shared_info(text: &str) -> Result<Map<String, Value>, IngestError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(IngestError::MalformedReport("shared_info is not an object".to_string())),
        Err(err) => Err(IngestError::MalformedReport(format!("shared_info: {err}"))),
    }
}

/// Looks up a text-keyed field of a CBOR map.
fn map_field<'a>(item: &'a CborValue, key: &str) -> Result<&'a CborValue, PayloadError> {
    let CborValue::Map(map) = item else {
        return Err(PayloadError::Shape("expected a map".to_string()));
    };
    map.get(&CborValue::Text(key.to_string()))
        .ok_or_else(|| PayloadError::Shape(format!("missing {key}")))
}

/// Returns the byte string stored under `key`.
fn map_bytes<'a>(item: &'a CborValue, key: &'static str) -> Result<&'a [u8], PayloadError> {
    match map_field(item, key)? {
        CborValue::Bytes(bytes) => Ok(bytes),
        _ => Err(PayloadError::Shape(format!("{key} must be a byte string"))),
    }
}

/// Decodes one `{value, bucket}` map.
fn decode_contribution(item: &CborValue, layout: BucketLayout) -> Result<Contribution, PayloadError> {
    let value_bytes = map_bytes(item, "value")?;
    let value: [u8; VALUE_BYTES] =
        value_bytes.try_into().map_err(|_| PayloadError::ByteLength {
            field: "value",
            expected: VALUE_BYTES,
            actual: value_bytes.len(),
        })?;
    let bucket_bytes = map_bytes(item, "bucket")?;
    let bucket = KeyPiece::from_be_slice(bucket_bytes).map_err(|_| PayloadError::ByteLength {
        field: "bucket",
        expected: KEY_PIECE_BYTES,
        actual: bucket_bytes.len(),
    })?;
    Ok(Contribution {
        value: u32::from_be_bytes(value),
        bucket,
        decoded: decode_bucket(layout, bucket),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
