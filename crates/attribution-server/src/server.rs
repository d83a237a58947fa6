// crates/attribution-server/src/server.rs
// ============================================================================
// Module: Attribution Server
// Description: HTTP server wiring for registration and report routes.
// Purpose: Build shared state from configuration and serve it over axum.
// Dependencies: attribution-config, attribution-core, axum, tokio
// ============================================================================

//! ## Overview
//! [`SspServer`] owns the validated configuration and the shared route
//! state. The report store is injectable so callers can observe or replace
//! it; by default an in-memory store lives for the life of the process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use attribution_config::AttributionConfig;
use attribution_config::ServerAuditConfig;
use attribution_core::ReportIngestor;
use attribution_core::SharedReportStore;
use axum::Router;
use tokio::net::TcpListener;

use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::routes::ServerState;
use crate::routes::router;

// ============================================================================
// SECTION: Server
// ============================================================================

/// Attribution server instance.
pub struct SspServer {
    /// Bind address from configuration.
    bind: SocketAddr,
    /// Maximum request body size.
    max_body_bytes: usize,
    /// Shared route state.
    state: Arc<ServerState>,
}

impl SspServer {
    /// Builds a server from configuration with a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn from_config(config: AttributionConfig) -> Result<Self, ServerError> {
        Self::with_store(config, SharedReportStore::default())
    }

    /// Builds a server from configuration over an existing store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn with_store(
        mut config: AttributionConfig,
        store: SharedReportStore,
    ) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let bind = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let builder =
            config.registration.builder().map_err(|err| ServerError::Config(err.to_string()))?;
        let audit = build_audit_sink(&config.server.audit)?;
        let state = Arc::new(ServerState {
            builder,
            ingestor: ReportIngestor::new(store, config.ingest.policy()),
            audit,
        });
        Ok(Self {
            bind,
            max_body_bytes: config.server.max_body_bytes,
            state,
        })
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Returns the route table bound to this server's state.
    #[must_use]
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.state), self.max_body_bytes)
    }

    /// Binds the configured address and serves requests.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_on(listener).await
    }

    /// Serves requests on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when serving fails.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ServerError> {
        axum::serve(listener, self.router())
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

/// Builds the audit sink selected by configuration.
fn build_audit_sink(config: &ServerAuditConfig) -> Result<Arc<dyn AuditSink>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match config.path.as_deref() {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path.trim()))
                .map_err(|err| ServerError::Init(format!("audit log open failed: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Attribution server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
