use axum::{
    extract::{
        rejection::{BytesRejection, QueryRejection},
        DefaultBodyLimit, Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::TokenProvider;
use crate::error::ApiError;
use crate::http_client::GenesysHttpClient;
use crate::models::{ProxyQuery, ProxyRequest};

/// Application version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Route the browser client calls
pub const PROXY_ROUTE: &str = "/api/genesys/proxy";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub token_provider: Arc<TokenProvider>,
    pub http_client: Arc<GenesysHttpClient>,
}

/// Health check routes (no authentication required)
pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
}

/// Genesys proxy route
///
/// Mutating bodies are forwarded whole, so axum's default body limit is off.
pub fn proxy_routes(state: AppState) -> Router {
    Router::new()
        .route(
            PROXY_ROUTE,
            get(proxy_handler)
                .post(proxy_handler)
                .put(proxy_handler)
                .patch(proxy_handler)
                .delete(proxy_handler),
        )
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// GET / - Simple health check
async fn root_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Genesys Bridge is running",
        "version": VERSION
    }))
}

/// GET /health - Detailed health check
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": VERSION
    }))
}

/// GET|POST|PUT|PATCH|DELETE /api/genesys/proxy?path=/api/v2/...
///
/// Forwards the call to the Genesys API with a broker-held bearer token.
/// Successful responses are relayed as-is; upstream errors keep their status
/// and are wrapped as `{error, details}`.
async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4().to_string()[..8].to_string();

    let Query(pairs) = query.map_err(|rejection| {
        tracing::warn!("[{}] Unreadable query string: {}", request_id, rejection);
        ApiError::InvalidRequest {
            status: rejection.status(),
            details: rejection.body_text(),
        }
    })?;
    let body = body.map_err(|rejection| {
        tracing::warn!("[{}] Unreadable request body: {}", request_id, rejection);
        ApiError::InvalidRequest {
            status: rejection.status(),
            details: rejection.body_text(),
        }
    })?;
    let query = ProxyQuery::from_pairs(pairs);

    let Some(path) = query.target_path() else {
        tracing::warn!("[{}] {} {} without path parameter", request_id, method, PROXY_ROUTE);
        return Err(ApiError::MissingParameter("path"));
    };

    tracing::debug!("[{}] Proxy request: {} {}", request_id, method, path);

    let request = ProxyRequest::new(method.clone(), path, body);

    match forward(&state, request).await {
        Ok(response) => Ok(response),
        Err(err) => {
            match &err {
                ApiError::Upstream { status, .. } => tracing::warn!(
                    "[{}] Genesys returned {} for {} {}",
                    request_id,
                    status,
                    method,
                    path
                ),
                _ => tracing::error!(
                    kind = err.kind(),
                    "[Genesys Proxy Error] [{}] {} {}: {}",
                    request_id,
                    method,
                    path,
                    err
                ),
            }
            Err(err)
        }
    }
}

/// Acquire a token and relay the upstream response
async fn forward(state: &AppState, request: ProxyRequest) -> Result<Response, ApiError> {
    let token = state.token_provider.acquire_token().await?;

    let upstream = state.http_client.forward(request, &token).await?;

    if !upstream.status.is_success() {
        return Err(ApiError::Upstream {
            status: upstream.status.as_u16(),
            body: upstream.body,
        });
    }

    // 204 and 304 carry no body
    if upstream.status == StatusCode::NO_CONTENT || upstream.status == StatusCode::NOT_MODIFIED {
        return Ok(upstream.status.into_response());
    }

    Ok((upstream.status, Json(upstream.body)).into_response())
}
