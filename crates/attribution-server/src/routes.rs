// crates/attribution-server/src/routes.rs
// ============================================================================
// Module: HTTP Routes
// Description: Registration and report endpoints of the attribution server.
// Purpose: Translate HTTP requests into core registration and ingestion calls.
// Dependencies: attribution-core, axum, serde, serde_json
// ============================================================================

//! ## Overview
//! Registration routes answer ordinary page and pixel requests and attach
//! `Attribution-Reporting-Register-*` headers when the browser declares the
//! request eligible. Report routes accept aggregatable reports posted to the
//! well-known endpoints.
//!
//! Security posture: query strings, headers and bodies are untrusted. Query
//! values are validated by the core builder before anything is encoded or
//! echoed back, and bodies are capped by the configured limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use attribution_core::CodecError;
use attribution_core::IngestError;
use attribution_core::RegistrationBuilder;
use attribution_core::ReportIngestor;
use attribution_core::SourceRequest;
use attribution_core::SourceType;
use attribution_core::TriggerRequest;
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;

use crate::audit::AuditOutcome;
use crate::audit::AuditSink;
use crate::audit::RegistrationAuditEvent;
use crate::audit::ReportAuditEvent;
use crate::audit::ReportAuditEventParams;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Request header listing the registrations a request is eligible for.
pub const ELIGIBLE_HEADER: &str = "attribution-reporting-eligible";
/// Response header carrying a source registration.
pub const REGISTER_SOURCE_HEADER: &str = "attribution-reporting-register-source";
/// Response header carrying a trigger registration.
pub const REGISTER_TRIGGER_HEADER: &str = "attribution-reporting-register-trigger";
/// Debug aggregatable report endpoint.
pub const DEBUG_REPORT_PATH: &str =
    "/.well-known/attribution-reporting/debug/report-aggregate-attribution";
/// Aggregatable report endpoint.
pub const REPORT_PATH: &str = "/.well-known/attribution-reporting/report-aggregate-attribution";

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state for route handlers.
pub(crate) struct ServerState {
    /// Registration builder.
    pub(crate) builder: RegistrationBuilder,
    /// Report ingestor and store.
    pub(crate) ingestor: ReportIngestor,
    /// Audit sink.
    pub(crate) audit: Arc<dyn AuditSink>,
}

/// Builds the route table.
pub(crate) fn router(state: Arc<ServerState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/move", get(handle_move))
        .route("/creative", get(handle_creative))
        .route("/register-trigger", get(handle_register_trigger))
        .route("/reports", get(handle_reports))
        .route(DEBUG_REPORT_PATH, post(handle_debug_report))
        .route(REPORT_PATH, post(handle_report))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

// ============================================================================
// SECTION: Request and Response Bodies
// ============================================================================

/// Query for `/move` and `/creative`.
#[derive(Debug, Deserialize)]
struct ItemQuery {
    /// Advertiser name.
    advertiser: Option<String>,
    /// Hexadecimal item identifier.
    id: Option<String>,
}

/// Query for `/register-trigger`.
#[derive(Debug, Deserialize)]
struct TriggerQuery {
    /// Hexadecimal item identifier.
    id: Option<String>,
    /// Purchased quantity.
    quantity: Option<String>,
    /// Size code.
    size: Option<String>,
    /// Category code.
    category: Option<String>,
    /// Purchase amount.
    gross: Option<String>,
}

/// Response to an accepted debug report.
#[derive(Debug, Serialize)]
struct IngestSummary {
    /// Report identifier from `shared_info`.
    report_id: Option<String>,
    /// Payloads received.
    payload_count: usize,
    /// Payloads kept undecoded.
    undecoded_count: usize,
}

/// Response to an acknowledged report.
#[derive(Debug, Serialize)]
struct AckSummary {
    /// Payloads received.
    payload_count: usize,
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Error kind label.
    error: &'static str,
    /// Human-readable message.
    message: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Handler error rendered as a JSON response.
#[derive(Debug)]
struct ApiError {
    /// Response status.
    status: StatusCode,
    /// Error kind label.
    kind: &'static str,
    /// Human-readable message.
    message: String,
}

impl ApiError {
    /// Missing query parameter.
    fn missing(name: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "missing_parameter",
            message: format!("missing query parameter: {name}"),
        }
    }

    /// Query value rejected by the codec.
    fn codec(err: &CodecError) -> Self {
        let kind = match err {
            CodecError::FieldOverflow {
                ..
            } => "field_overflow",
            CodecError::UnknownDomainCode {
                ..
            } => "unknown_domain_code",
            CodecError::InvalidField {
                ..
            } => "invalid_field",
            CodecError::InvalidKeyPiece(_) => "invalid_key_piece",
            CodecError::ArityMismatch {
                ..
            } => "arity_mismatch",
        };
        Self {
            status: StatusCode::BAD_REQUEST,
            kind,
            message: err.to_string(),
        }
    }

    /// Ingestion failure.
    fn ingest(err: &IngestError) -> Self {
        match err {
            IngestError::MalformedReport(_) => Self {
                status: StatusCode::BAD_REQUEST,
                kind: "malformed_report",
                message: err.to_string(),
            },
            IngestError::Store(_) => Self::internal("store", err.to_string()),
        }
    }

    /// Server-side failure.
    fn internal(kind: &'static str, message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// SECTION: Registration Handlers
// ============================================================================

/// Handles `/move`: click-through navigation to the advertiser.
async fn handle_move(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Query(query): Query<ItemQuery>,
) -> Response {
    let eligible = eligible_tokens(&headers).contains("navigation-source");
    let result = source_response(&state, &query, SourceType::Click, eligible, |destination, id| {
        let location = HeaderValue::from_str(&format!("{destination}/items/{id}"))
            .map_err(|err| ApiError::internal("header", err.to_string()))?;
        Ok((StatusCode::FOUND, [(LOCATION, location)]).into_response())
    });
    finish_registration(&state, "/move", "source", eligible, result)
}

/// Handles `/creative`: view-through impression.
async fn handle_creative(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Query(query): Query<ItemQuery>,
) -> Response {
    let tokens = eligible_tokens(&headers);
    let eligible = tokens.contains("event-source") && tokens.contains("trigger");
    let result = source_response(&state, &query, SourceType::View, eligible, |_, _| {
        Ok(StatusCode::OK.into_response())
    });
    finish_registration(&state, "/creative", "source", eligible, result)
}

/// Handles `/register-trigger`: conversion on the advertiser site.
async fn handle_register_trigger(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<TriggerQuery>,
) -> Response {
    let result = trigger_response(&state, &query);
    finish_registration(&state, "/register-trigger", "trigger", true, result)
}

/// Validates a trigger query and attaches the registration header.
fn trigger_response(state: &ServerState, query: &TriggerQuery) -> Result<Response, ApiError> {
    let request = TriggerRequest {
        item_id: required(query.id.as_deref(), "id")?,
        quantity: required(query.quantity.as_deref(), "quantity")?,
        size: required(query.size.as_deref(), "size")?,
        category: required(query.category.as_deref(), "category")?,
        gross: required(query.gross.as_deref(), "gross")?,
    };
    let registration =
        state.builder.trigger_registration(&request).map_err(|err| ApiError::codec(&err))?;
    let mut response = StatusCode::OK.into_response();
    response.headers_mut().insert(REGISTER_TRIGGER_HEADER, header_json(&registration)?);
    Ok(response)
}

/// Validates a source query, builds the base response and attaches the
/// registration header when eligible.
fn source_response(
    state: &ServerState,
    query: &ItemQuery,
    source_type: SourceType,
    eligible: bool,
    base: impl FnOnce(&str, &str) -> Result<Response, ApiError>,
) -> Result<Response, ApiError> {
    let advertiser = required(query.advertiser.as_deref(), "advertiser")?;
    let item_id = required(query.id.as_deref(), "id")?;
    let registration = state
        .builder
        .source_registration(&SourceRequest {
            source_type,
            advertiser,
            item_id,
        })
        .map_err(|err| ApiError::codec(&err))?;
    let mut response = base(&registration.destination, item_id.trim())?;
    if eligible {
        response.headers_mut().insert(REGISTER_SOURCE_HEADER, header_json(&registration)?);
    }
    Ok(response)
}

/// Records the registration outcome and renders the response.
fn finish_registration(
    state: &ServerState,
    route: &'static str,
    kind: &'static str,
    eligible: bool,
    result: Result<Response, ApiError>,
) -> Response {
    match result {
        Ok(response) => {
            let outcome =
                if eligible { AuditOutcome::Registered } else { AuditOutcome::Skipped };
            state
                .audit
                .record_registration(&RegistrationAuditEvent::new(route, kind, outcome, None));
            response
        }
        Err(err) => {
            state.audit.record_registration(&RegistrationAuditEvent::new(
                route,
                kind,
                AuditOutcome::Rejected,
                Some(err.kind),
            ));
            err.into_response()
        }
    }
}

// ============================================================================
// SECTION: Report Handlers
// ============================================================================

/// Returns a snapshot of stored reports.
async fn handle_reports(State(state): State<Arc<ServerState>>) -> Response {
    match state.ingestor.reports() {
        Ok(reports) => Json(reports).into_response(),
        Err(err) => ApiError::ingest(&err).into_response(),
    }
}

/// Decodes and stores a debug report.
async fn handle_debug_report(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let request_bytes = body.len();
    match state.ingestor.ingest_json(&body) {
        Ok(report) => {
            let summary = IngestSummary {
                report_id: report.report_id().map(str::to_string),
                payload_count: report.aggregation_service_payloads.len(),
                undecoded_count: report.undecoded_count(),
            };
            state.audit.record_report(&ReportAuditEvent::new(ReportAuditEventParams {
                debug: true,
                outcome: AuditOutcome::Stored,
                report_id: summary.report_id.clone(),
                payload_count: summary.payload_count,
                undecoded_count: summary.undecoded_count,
                request_bytes,
                error_kind: None,
            }));
            Json(summary).into_response()
        }
        Err(err) => reject_report(&state, true, request_bytes, &err),
    }
}

/// Acknowledges a non-debug report.
async fn handle_report(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let request_bytes = body.len();
    match state.ingestor.acknowledge_json(&body) {
        Ok(ack) => {
            state.audit.record_report(&ReportAuditEvent::new(ReportAuditEventParams {
                debug: false,
                outcome: AuditOutcome::Acknowledged,
                report_id: ack
                    .shared_info
                    .get("report_id")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string),
                payload_count: ack.payload_count,
                undecoded_count: 0,
                request_bytes,
                error_kind: None,
            }));
            Json(AckSummary {
                payload_count: ack.payload_count,
            })
            .into_response()
        }
        Err(err) => reject_report(&state, false, request_bytes, &err),
    }
}

/// Records a rejected report and renders the error.
fn reject_report(
    state: &ServerState,
    debug: bool,
    request_bytes: usize,
    err: &IngestError,
) -> Response {
    let api_error = ApiError::ingest(err);
    state.audit.record_report(&ReportAuditEvent::new(ReportAuditEventParams {
        debug,
        outcome: AuditOutcome::Rejected,
        report_id: None,
        payload_count: 0,
        undecoded_count: 0,
        request_bytes,
        error_kind: Some(api_error.kind),
    }));
    api_error.into_response()
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns a required query value.
fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ApiError> {
    value.filter(|text| !text.trim().is_empty()).ok_or_else(|| ApiError::missing(name))
}

/// Serializes a registration into a header value.
fn header_json(value: &impl Serialize) -> Result<HeaderValue, ApiError> {
    let text = serde_json::to_string(value)
        .map_err(|err| ApiError::internal("serialize", err.to_string()))?;
    HeaderValue::from_str(&text).map_err(|err| ApiError::internal("header", err.to_string()))
}

/// Collects the member names of the eligibility header.
///
/// The header is a structured-field dictionary (`event-source, trigger`);
/// parameters and values after `=` or `;` are ignored.
pub(crate) fn eligible_tokens(headers: &HeaderMap) -> BTreeSet<String> {
    headers
        .get_all(ELIGIBLE_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|member| {
            let key = member.split(['=', ';']).next()?.trim();
            (!key.is_empty()).then(|| key.to_ascii_lowercase())
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        reason = "Test-only assertions."
    )]

    use axum::http::HeaderMap;
    use axum::http::HeaderValue;

    use super::ELIGIBLE_HEADER;
    use super::eligible_tokens;

    #[test]
    fn eligible_header_members_are_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(ELIGIBLE_HEADER, HeaderValue::from_static("event-source, Trigger;x=1"));
        let tokens = eligible_tokens(&headers);
        assert!(tokens.contains("event-source"));
        assert!(tokens.contains("trigger"));
        assert!(!tokens.contains("navigation-source"));
    }

    #[test]
    fn missing_eligible_header_is_empty() {
        assert!(eligible_tokens(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn dictionary_values_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(ELIGIBLE_HEADER, HeaderValue::from_static("navigation-source=?1"));
        assert!(eligible_tokens(&headers).contains("navigation-source"));
    }
}
