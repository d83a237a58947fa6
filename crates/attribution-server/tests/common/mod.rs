// crates/attribution-server/tests/common/mod.rs
// =============================================================================
// Module: Server Test Helpers
// Description: Spawns the attribution server on a loopback port.
// Purpose: Share server setup and fixtures across HTTP integration tests.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::BTreeMap;

use attribution_config::AttributionConfig;
use attribution_core::SharedReportStore;
use attribution_server::SspServer;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_cbor::Value;
use tokio::net::TcpListener;

/// Running server handle.
pub struct TestServer {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Store shared with the server.
    pub store: SharedReportStore,
}

impl TestServer {
    /// Joins a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Returns a config with audit logging disabled.
pub fn quiet_config() -> AttributionConfig {
    let mut config = AttributionConfig::default();
    config.server.audit.enabled = false;
    config
}

/// Spawns a server with `config` on an ephemeral loopback port.
pub async fn spawn_server(config: AttributionConfig) -> Result<TestServer, String> {
    let store = SharedReportStore::default();
    let server = SspServer::with_store(config, store.clone()).map_err(|err| err.to_string())?;
    let listener =
        TcpListener::bind("127.0.0.1:0").await.map_err(|err| format!("bind failed: {err}"))?;
    let addr = listener.local_addr().map_err(|err| format!("local addr failed: {err}"))?;
    tokio::spawn(async move {
        let _ = server.serve_on(listener).await;
    });
    Ok(TestServer {
        base_url: format!("http://{addr}"),
        store,
    })
}

/// Returns a client that does not follow redirects.
pub fn client() -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|err| err.to_string())
}

/// Encodes one histogram entry as base64 CBOR.
pub fn histogram_cleartext(value: u32, bucket: u128) -> String {
    let mut contribution = BTreeMap::new();
    contribution.insert(Value::Text("value".to_string()), Value::Bytes(value.to_be_bytes().to_vec()));
    contribution
        .insert(Value::Text("bucket".to_string()), Value::Bytes(bucket.to_be_bytes().to_vec()));
    let mut entry = BTreeMap::new();
    entry.insert(Value::Text("operation".to_string()), Value::Text("histogram".to_string()));
    entry.insert(Value::Text("data".to_string()), Value::Array(vec![Value::Map(contribution)]));
    let bytes = serde_cbor::to_vec(&Value::Map(entry)).unwrap_or_default();
    STANDARD.encode(bytes)
}
