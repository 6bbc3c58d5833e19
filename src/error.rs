// Error handling module
// Defines error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::TokenError;

/// Label for transport failures
pub const BRIDGE_FAILURE: &str = "Genesys Bridge Failure";

/// Label for missing credential configuration
pub const CONFIG_FAILURE: &str = "Genesys Configuration Error";

/// Label for identity endpoint rejections
pub const OAUTH_FAILURE: &str = "Genesys OAuth Failed";

/// Label for inbound requests that could not be read
pub const INVALID_REQUEST: &str = "Invalid Request";

/// API errors that can occur during request processing
#[derive(Error, Debug)]
pub enum ApiError {
    /// A required query parameter is absent
    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    /// The inbound query string or body could not be extracted
    #[error("Invalid request: {details}")]
    InvalidRequest { status: StatusCode, details: String },

    /// Token acquisition failed
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The proxied API returned a non-success status
    #[error("Genesys API error: {status}")]
    Upstream { status: u16, body: Value },

    /// Transport failure reaching the proxied API
    #[error("Genesys API request failed: {0}")]
    Network(String),
}

impl ApiError {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingParameter(_) | ApiError::InvalidRequest { .. } => "client_input",
            ApiError::Token(TokenError::Configuration(_)) => "configuration",
            ApiError::Token(TokenError::UpstreamAuth { .. }) => "upstream_auth",
            ApiError::Token(TokenError::Network(_)) | ApiError::Network(_) => "network",
            ApiError::Upstream { .. } => "upstream",
        }
    }
}

/// Human-readable message for a failed upstream response
///
/// Uses the upstream `message` field when present, otherwise the status.
pub fn upstream_message(status: u16, body: &Value) -> String {
    body.get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Genesys Error {}", status))
}

/// Keep a JSON error body structured, fall back to the raw text
fn details_from_text(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

fn status_or_500(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingParameter(name) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Missing {} parameter", name) }),
            ),
            ApiError::InvalidRequest { status, details } => (
                status,
                json!({ "error": INVALID_REQUEST, "details": details }),
            ),
            ApiError::Token(TokenError::Configuration(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": CONFIG_FAILURE, "details": msg }),
            ),
            ApiError::Token(TokenError::UpstreamAuth { status, body }) => (
                status_or_500(status),
                json!({ "error": OAUTH_FAILURE, "details": details_from_text(body) }),
            ),
            ApiError::Token(err @ TokenError::Network(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": BRIDGE_FAILURE, "details": err.to_string() }),
            ),
            ApiError::Upstream { status, body } => (
                status_or_500(status),
                json!({ "error": upstream_message(status, &body), "details": body }),
            ),
            ApiError::Network(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": BRIDGE_FAILURE, "details": msg }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
