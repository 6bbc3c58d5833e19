// Proxy request and response models

use bytes::Bytes;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

/// Query string of an inbound proxy call
#[derive(Debug, Default)]
pub struct ProxyQuery {
    /// Upstream sub-path, already percent-decoded by the extractor
    pub path: Option<String>,
}

impl ProxyQuery {
    /// Build from decoded query pairs; a repeated `path` keeps its first value
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let path = pairs
            .into_iter()
            .find_map(|(key, value)| (key == "path").then_some(value));
        Self { path }
    }

    /// The target path, with an empty value counted as missing
    pub fn target_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }
}

/// A request to forward upstream
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    /// Raw body bytes, present only for mutating methods
    pub body: Option<Bytes>,
}

impl ProxyRequest {
    /// Keep the inbound body only when the method carries one
    pub fn new(method: Method, path: impl Into<String>, body: Bytes) -> Self {
        let body = is_mutating(&method).then_some(body);
        Self {
            method,
            path: path.into(),
            body,
        }
    }
}

/// Methods whose inbound body is forwarded
pub fn is_mutating(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

/// Status and JSON body received from the proxied API
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl UpstreamResponse {
    /// Parse an upstream body; anything that is not JSON becomes `{}`
    pub fn from_bytes(status: StatusCode, bytes: &[u8]) -> Self {
        let body: Value = serde_json::from_slice(bytes).unwrap_or_else(|_| json!({}));
        Self { status, body }
    }
}
