// crates/attribution-core/tests/store.rs
// ============================================================================
// Module: Report Store Tests
// Description: Tests for the in-memory report store implementation.
// Purpose: Validate atomic appends and consistent snapshots under concurrency.
// Dependencies: attribution-core
// ============================================================================
//! ## Overview
//! Ensures concurrent appends are neither lost nor torn and that snapshots
//! are detached from later appends.

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

use std::sync::Arc;
use std::thread;

use attribution_core::CleartextPayload;
use attribution_core::DebugReport;
use attribution_core::InMemoryReportStore;
use attribution_core::IngestedPayload;
use attribution_core::ReportStore;
use attribution_core::SharedReportStore;
use serde_json::Map;
use serde_json::json;

fn sample_report(id: usize) -> DebugReport {
    let mut shared_info = Map::new();
    shared_info.insert("report_id".to_string(), json!(format!("r-{id}")));
    DebugReport {
        shared_info,
        aggregation_service_payloads: vec![IngestedPayload {
            payload: None,
            key_id: None,
            debug_cleartext_payload: CleartextPayload::Decoded {
                entries: Vec::new(),
            },
        }],
        source_debug_key: None,
        trigger_debug_key: None,
        extra: Map::new(),
    }
}

#[test]
fn store_preserves_arrival_order() {
    let store = InMemoryReportStore::new();
    assert!(store.is_empty().unwrap());
    for id in 0 .. 3 {
        store.append(sample_report(id)).unwrap();
    }
    let ids: Vec<_> =
        store.list().unwrap().iter().map(|report| report.report_id().unwrap().to_string()).collect();
    assert_eq!(ids, vec!["r-0", "r-1", "r-2"]);
}

#[test]
fn snapshot_is_detached_from_later_appends() {
    let store = SharedReportStore::default();
    store.append(sample_report(0)).unwrap();
    let snapshot = store.list().unwrap();
    store.append(sample_report(1)).unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(store.len().unwrap(), 2);
}

#[test]
fn concurrent_appends_are_all_retained() {
    let store = SharedReportStore::new(Arc::new(InMemoryReportStore::new()));
    let handles: Vec<_> = (0 .. 8)
        .map(|worker| {
            let store = store.clone();
            thread::spawn(move || {
                for offset in 0 .. 25 {
                    store.append(sample_report(worker * 100 + offset)).unwrap();
                    let snapshot = store.list().unwrap();
                    assert!(snapshot.iter().all(|report| report.aggregation_service_payloads.len() == 1));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let reports = store.list().unwrap();
    assert_eq!(reports.len(), 200);
    let mut ids: Vec<_> = reports.iter().filter_map(DebugReport::report_id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 200);
}
