// crates/attribution-core/tests/ingest.rs
// ============================================================================
// Module: Report Ingestion Tests
// Description: Decoding of aggregatable debug reports into the store.
// Purpose: Validate payload decoding, failure isolation, and acknowledgement.
// Dependencies: attribution-core, base64, serde_cbor, serde_json
// ============================================================================
//! ## Overview
//! Builds CBOR payload fixtures the way the browser encodes them and checks
//! what the ingestor stores.
//!
//! Security posture: report bodies are untrusted; malformed payloads must be
//! isolated and malformed envelopes rejected.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;
use std::thread;

use attribution_core::Advertiser;
use attribution_core::BucketLayout;
use attribution_core::CleartextPayload;
use attribution_core::DecodedBucket;
use attribution_core::Dimension;
use attribution_core::DomainValue;
use attribution_core::IngestError;
use attribution_core::IngestPolicy;
use attribution_core::KeyPiece;
use attribution_core::Publisher;
use attribution_core::RawAggregatableReport;
use attribution_core::RawServicePayload;
use attribution_core::ReportIngestor;
use attribution_core::ReportStore;
use attribution_core::SharedReportStore;
use attribution_core::SourceKeyFields;
use attribution_core::SourceType;
use attribution_core::TriggerKeyFields;
use attribution_core::TriggerType;
use attribution_core::runtime::codec::encode_source;
use attribution_core::runtime::codec::encode_trigger;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_cbor::Value;
use serde_json::json;

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn contribution(value: &[u8], bucket: &[u8]) -> Value {
    let mut map = BTreeMap::new();
    map.insert(text("value"), Value::Bytes(value.to_vec()));
    map.insert(text("bucket"), Value::Bytes(bucket.to_vec()));
    Value::Map(map)
}

fn entry(operation: &str, data: Vec<Value>) -> Value {
    let mut map = BTreeMap::new();
    map.insert(text("operation"), text(operation));
    map.insert(text("data"), Value::Array(data));
    Value::Map(map)
}

fn cleartext(entry: &Value) -> String {
    STANDARD.encode(serde_cbor::to_vec(entry).unwrap())
}

fn payload(cleartext: Option<String>) -> RawServicePayload {
    RawServicePayload {
        payload: Some("opaque".to_string()),
        key_id: Some("key-1".to_string()),
        debug_cleartext_payload: cleartext,
    }
}

fn report(payloads: Vec<RawServicePayload>) -> RawAggregatableReport {
    RawAggregatableReport {
        shared_info: json!({"report_id": "r-1", "api": "attribution-reporting"}).to_string(),
        aggregation_service_payloads: payloads,
        source_debug_key: Some("11".to_string()),
        trigger_debug_key: Some("22".to_string()),
        extra: serde_json::Map::new(),
    }
}

fn combined_bucket() -> KeyPiece {
    let source = encode_source(&SourceKeyFields {
        source_type: SourceType::Click,
        advertiser: Advertiser::Shop,
        publisher: Publisher::News,
        item_id: 0x1f,
        dimension: Dimension::Gross,
    })
    .unwrap();
    let trigger = encode_trigger(&TriggerKeyFields {
        trigger_type: TriggerType::Gross,
        item_id: 0x1f,
        size: 3,
        category: 7,
        option: 0,
    })
    .unwrap();
    KeyPiece::new(source.value() | trigger.value())
}

#[test]
fn values_are_read_big_endian() {
    let ingestor = ReportIngestor::default();
    let bucket = combined_bucket().to_be_bytes();
    let body = entry(
        "histogram",
        vec![
            contribution(&[0x00, 0x00, 0x00, 0x2a], &bucket),
            contribution(&[0x2a, 0x00, 0x00, 0x00], &bucket),
        ],
    );
    let stored = ingestor.ingest(report(vec![payload(Some(cleartext(&body)))])).unwrap();
    let CleartextPayload::Decoded {
        entries,
    } = &stored.aggregation_service_payloads[0].debug_cleartext_payload
    else {
        panic!("expected decoded payload");
    };
    assert_eq!(entries[0].operation, "histogram");
    assert_eq!(entries[0].data[0].value, 42);
    assert_ne!(entries[0].data[1].value, 42);
    assert_eq!(entries[0].data[1].value, 0x2a00_0000);
}

#[test]
fn histogram_buckets_decode_both_halves() {
    let ingestor = ReportIngestor::default();
    let body = entry("histogram", vec![contribution(&[0, 0, 0, 5], &combined_bucket().to_be_bytes())]);
    let stored = ingestor.ingest(report(vec![payload(Some(cleartext(&body)))])).unwrap();
    let CleartextPayload::Decoded {
        entries,
    } = &stored.aggregation_service_payloads[0].debug_cleartext_payload
    else {
        panic!("expected decoded payload");
    };
    let DecodedBucket::Combined {
        source,
        trigger,
    } = entries[0].data[0].decoded
    else {
        panic!("expected combined bucket");
    };
    assert_eq!(source.advertiser, DomainValue::Known(Advertiser::Shop));
    assert_eq!(source.dimension, DomainValue::Known(Dimension::Gross));
    assert_eq!(source.item_id, 0x1f);
    assert_eq!(trigger.trigger_type, DomainValue::Known(TriggerType::Gross));
    assert_eq!(trigger.size, 3);
    assert_eq!(trigger.category, 7);
}

#[test]
fn other_operations_use_default_layout() {
    let ingestor = ReportIngestor::new(
        SharedReportStore::default(),
        IngestPolicy {
            default_layout: BucketLayout::Trigger,
            ..IngestPolicy::default()
        },
    );
    let body = entry("sum", vec![contribution(&[0, 0, 0, 1], &combined_bucket().to_be_bytes())]);
    let stored = ingestor.ingest(report(vec![payload(Some(cleartext(&body)))])).unwrap();
    let CleartextPayload::Decoded {
        entries,
    } = &stored.aggregation_service_payloads[0].debug_cleartext_payload
    else {
        panic!("expected decoded payload");
    };
    assert!(matches!(entries[0].data[0].decoded, DecodedBucket::Trigger(_)));
}

#[test]
fn malformed_payload_is_kept_and_report_stored() {
    let store = SharedReportStore::default();
    let ingestor = ReportIngestor::new(store.clone(), IngestPolicy::default());
    let good = cleartext(&entry("histogram", vec![contribution(&[0, 0, 0, 1], &[0; 16])]));
    let short_bucket = cleartext(&entry("histogram", vec![contribution(&[0, 0, 0, 1], &[0; 15])]));
    let stored = ingestor
        .ingest(report(vec![
            payload(Some(good.clone())),
            payload(Some("not base64 !!".to_string())),
            payload(Some(good)),
        ]))
        .unwrap();
    assert_eq!(stored.undecoded_count(), 1);
    let CleartextPayload::Undecoded {
        encoded,
        error,
    } = &stored.aggregation_service_payloads[1].debug_cleartext_payload
    else {
        panic!("expected undecoded payload");
    };
    assert_eq!(encoded.as_deref(), Some("not base64 !!"));
    assert!(error.contains("base64"));
    assert_eq!(store.len().unwrap(), 1);

    let stored = ingestor.ingest(report(vec![payload(Some(short_bucket))])).unwrap();
    let CleartextPayload::Undecoded {
        error, ..
    } = &stored.aggregation_service_payloads[0].debug_cleartext_payload
    else {
        panic!("expected undecoded payload");
    };
    assert!(error.contains("bucket must be 16 bytes"));
    assert_eq!(store.len().unwrap(), 2);
}

#[test]
fn missing_and_oversized_cleartext_are_undecoded() {
    let ingestor = ReportIngestor::new(
        SharedReportStore::default(),
        IngestPolicy {
            max_cleartext_bytes: 8,
            ..IngestPolicy::default()
        },
    );
    let stored = ingestor
        .ingest(report(vec![payload(None), payload(Some("A".repeat(9)))]))
        .unwrap();
    assert_eq!(stored.undecoded_count(), 2);
}

#[test]
fn non_map_cbor_is_undecoded() {
    let ingestor = ReportIngestor::default();
    let encoded = STANDARD.encode(serde_cbor::to_vec(&Value::Integer(7)).unwrap());
    let stored = ingestor.ingest(report(vec![payload(Some(encoded))])).unwrap();
    assert_eq!(stored.undecoded_count(), 1);
}

#[test]
fn malformed_shared_info_stores_nothing() {
    let store = SharedReportStore::default();
    let ingestor = ReportIngestor::new(store.clone(), IngestPolicy::default());
    let mut raw = report(Vec::new());
    raw.shared_info = "{not json".to_string();
    let err = ingestor.ingest(raw).unwrap_err();
    assert!(matches!(err, IngestError::MalformedReport(_)));
    assert!(store.is_empty().unwrap());
}

#[test]
fn payload_limit_rejects_report() {
    let ingestor = ReportIngestor::new(
        SharedReportStore::default(),
        IngestPolicy {
            max_payloads: 1,
            ..IngestPolicy::default()
        },
    );
    let err = ingestor.ingest(report(vec![payload(None), payload(None)])).unwrap_err();
    assert!(matches!(err, IngestError::MalformedReport(_)));
}

#[test]
fn json_body_round_trips_into_store() {
    let ingestor = ReportIngestor::default();
    let body = json!({
        "shared_info": "{\"report_id\":\"abc\"}",
        "aggregation_service_payloads": [{
            "payload": "x",
            "key_id": "k",
            "debug_cleartext_payload": cleartext(&entry("histogram", Vec::new())),
        }],
        "source_debug_key": "1",
        "trigger_debug_key": "2",
    });
    let stored = ingestor.ingest_json(body.to_string().as_bytes()).unwrap();
    assert_eq!(stored.report_id(), Some("abc"));
    let reports = ingestor.reports().unwrap();
    assert_eq!(reports, vec![stored]);
    assert!(matches!(ingestor.ingest_json(b"[]"), Err(IngestError::MalformedReport(_))));
}

#[test]
fn acknowledge_stores_nothing() {
    let store = SharedReportStore::default();
    let ingestor = ReportIngestor::new(store.clone(), IngestPolicy::default());
    let ack = ingestor.acknowledge(&report(vec![payload(None), payload(None)])).unwrap();
    assert_eq!(ack.payload_count, 2);
    assert_eq!(ack.shared_info.get("report_id"), Some(&json!("r-1")));
    assert!(store.is_empty().unwrap());
}

#[test]
fn unmodelled_top_level_members_are_kept() {
    let ingestor = ReportIngestor::default();
    let body = json!({
        "shared_info": "{\"report_id\":\"abc\"}",
        "aggregation_service_payloads": [],
        "aggregation_coordinator_origin": "https://publickeyservice.example",
        "version": "0.1",
    });
    let stored = ingestor.ingest_json(body.to_string().as_bytes()).unwrap();
    assert_eq!(stored.extra.get("version"), Some(&json!("0.1")));
    let rendered = serde_json::to_value(&stored).unwrap();
    assert_eq!(
        rendered.get("aggregation_coordinator_origin"),
        Some(&json!("https://publickeyservice.example"))
    );
    assert!(rendered.get("extra").is_none());
}

#[test]
fn concurrent_ingests_store_both_decoded_reports() {
    let ingestor = ReportIngestor::default();
    let bucket = combined_bucket().to_be_bytes();
    let handles: Vec<_> = ["r-1", "r-2"]
        .into_iter()
        .map(|report_id| {
            let ingestor = ingestor.clone();
            let body = cleartext(&entry("histogram", vec![contribution(&[0, 0, 0, 9], &bucket)]));
            thread::spawn(move || {
                let mut raw = report(vec![payload(Some(body))]);
                raw.shared_info = json!({ "report_id": report_id }).to_string();
                ingestor.ingest(raw).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let reports = ingestor.reports().unwrap();
    assert_eq!(reports.len(), 2);
    let mut ids: Vec<_> = reports.iter().filter_map(|stored| stored.report_id()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["r-1", "r-2"]);
    for stored in &reports {
        assert_eq!(stored.undecoded_count(), 0);
        let CleartextPayload::Decoded {
            entries,
        } = &stored.aggregation_service_payloads[0].debug_cleartext_payload
        else {
            panic!("expected decoded payload");
        };
        assert_eq!(entries[0].data[0].value, 9);
        assert!(matches!(entries[0].data[0].decoded, DecodedBucket::Combined { .. }));
    }
}
