use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use shared::{
    error::{ErrorBody, ErrorCode},
    protocol::{HealthResponse, SummarizeResponse, HEALTH_ROUTE, SUMMARIZE_ROUTE},
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    app_state::AppState,
    metrics::{extract_key_metrics, HostRecord},
    summarizer::SummaryError,
};

const MISSING_HOSTS: &str = "Invalid data format. Expected 'hosts' array.";

/// Error reply: a status code plus the `{"error": …}` envelope.
#[derive(Debug)]
pub(crate) struct ApiFailure {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiFailure {
    fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::new(code, message),
        }
    }

    fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::Validation, message)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<SummaryError> for ApiFailure {
    fn from(err: SummaryError) -> Self {
        let (status, code) = match &err {
            SummaryError::MissingApiKey => (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::Unavailable),
            _ => (StatusCode::BAD_GATEWAY, ErrorCode::Upstream),
        };
        Self::new(status, code, format!("Error generating summary: {err}"))
    }
}

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route(HEALTH_ROUTE, get(health))
        .route(SUMMARIZE_ROUTE, post(summarize))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SummarizeResponse>, ApiFailure> {
    let data = decode_submission(&headers, &body)?;
    let hosts = decode_hosts(&data)?;

    let metrics = extract_key_metrics(&hosts);
    info!(
        hosts = metrics.total_hosts,
        critical = metrics.critical_risk,
        high = metrics.high_risk,
        "summarizing host data"
    );

    let summary = state.provider.summarize(&data).await.map_err(|err| {
        warn!(%err, "summary generation failed");
        ApiFailure::from(err)
    })?;

    Ok(Json(SummarizeResponse {
        hosts_count: Some(metrics.total_hosts),
        metrics,
        summary,
    }))
}

/// JSON bodies are decoded directly; anything else is read as an urlencoded
/// form whose `data` field holds the JSON text.
fn decode_submission(headers: &HeaderMap, body: &[u8]) -> Result<Value, ApiFailure> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().starts_with("application/json"))
        .unwrap_or(false);

    let raw = if is_json {
        body.to_vec()
    } else {
        let data = url::form_urlencoded::parse(body)
            .find(|(key, _)| key == "data")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        if data.is_empty() {
            return Err(ApiFailure::validation("No data provided"));
        }
        data.into_bytes()
    };

    serde_json::from_slice(&raw).map_err(|_| ApiFailure::validation("Invalid JSON format"))
}

fn decode_hosts(data: &Value) -> Result<Vec<HostRecord>, ApiFailure> {
    let hosts = data
        .get("hosts")
        .ok_or_else(|| ApiFailure::validation(MISSING_HOSTS))?;
    serde_json::from_value(hosts.clone()).map_err(|_| ApiFailure::validation(MISSING_HOSTS))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
