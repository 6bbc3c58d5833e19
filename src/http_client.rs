use anyhow::{Context, Result};
use reqwest::{header, Client};
use std::time::Duration;

use crate::auth::{error_kind, AccessToken};
use crate::error::ApiError;
use crate::models::{ProxyRequest, UpstreamResponse};

/// HTTP client for the Genesys Cloud API
///
/// Failures are reported once and never retried.
pub struct GenesysHttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Base URL override (default: https://api.{region})
    api_url: Option<String>,
}

impl GenesysHttpClient {
    /// Create a new HTTP client
    pub fn new(
        api_url: Option<String>,
        max_connections: usize,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(max_connections)
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, api_url })
    }

    /// Build the upstream URL for a path; the path is appended verbatim
    pub fn api_url(&self, region: &str, path: &str) -> String {
        match &self.api_url {
            Some(base) => format!("{}{}", base, path),
            None => format!("https://api.{}{}", region, path),
        }
    }

    /// Forward a request to the Genesys API with the bearer token attached
    ///
    /// Any upstream status is returned as a response; only transport
    /// failures become errors.
    pub async fn forward(
        &self,
        request: ProxyRequest,
        token: &AccessToken,
    ) -> Result<UpstreamResponse, ApiError> {
        let url = self.api_url(&token.region, &request.path);

        tracing::debug!(
            method = %request.method,
            url = %url,
            has_body = request.body.is_some(),
            "Forwarding request to Genesys"
        );

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .bearer_auth(&token.token)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(
                error_kind = error_kind(&e),
                error = %e,
                url = %url,
                "Genesys API request error"
            );
            ApiError::Network(format!("{} (kind: {})", e, error_kind(&e)))
        })?;

        let status = response.status();
        // An unreadable body is treated like a non-JSON one
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(status = %status, error = %e, "Failed to read Genesys response body");
                bytes::Bytes::new()
            }
        };

        tracing::debug!(status = %status, "Received Genesys response");

        Ok(UpstreamResponse::from_bytes(status, &bytes))
    }

    /// Get the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mockito::Matcher;
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    fn token() -> AccessToken {
        AccessToken {
            token: "T".to_string(),
            region: "mec1.pure.cloud".to_string(),
        }
    }

    #[test]
    fn test_api_url_default() {
        let client = GenesysHttpClient::new(None, 20, 30, 60).unwrap();
        assert_eq!(
            client.api_url("mec1.pure.cloud", "/api/v2/users"),
            "https://api.mec1.pure.cloud/api/v2/users"
        );
    }

    #[test]
    fn test_api_url_override() {
        let client =
            GenesysHttpClient::new(Some("http://127.0.0.1:9000".to_string()), 20, 30, 60).unwrap();
        assert_eq!(
            client.api_url("ignored", "/api/v2/users?pageSize=25"),
            "http://127.0.0.1:9000/api/v2/users?pageSize=25"
        );
    }

    #[test]
    fn test_api_url_inserts_no_separator() {
        // Paths without a leading slash are not rejected; see DESIGN.md
        let client = GenesysHttpClient::new(None, 20, 30, 60).unwrap();
        assert_eq!(
            client.api_url("mec1.pure.cloud", "@other.example/x"),
            "https://api.mec1.pure.cloud@other.example/x"
        );
    }

    #[tokio::test]
    async fn test_forward_get_sets_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/users")
            .match_header("authorization", "Bearer T")
            .match_header("content-type", "application/json")
            .match_header("accept", "application/json")
            .match_body(Matcher::Exact(String::new()))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let client = GenesysHttpClient::new(Some(server.url()), 20, 30, 60).unwrap();
        let request = ProxyRequest::new(Method::GET, "/api/v2/users", Bytes::new());
        let response = client.forward(request, &token()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_forward_post_body_unmodified() {
        let raw = r#"{"interval":"2024-01-01T00:00:00Z/2024-01-02T00:00:00Z","order":"asc"}"#;
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/analytics/conversations/details/query")
            .match_body(Matcher::Exact(raw.to_string()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = GenesysHttpClient::new(Some(server.url()), 20, 30, 60).unwrap();
        let request = ProxyRequest::new(
            Method::POST,
            "/api/v2/analytics/conversations/details/query",
            Bytes::from(raw),
        );
        client.forward(request, &token()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forward_binary_body_byte_for_byte() {
        let raw = vec![0x7b, 0xff, 0xfe, 0x00, 0x80, 0x7d];
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v2/files")
            .match_body(Matcher::from(raw.clone()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = GenesysHttpClient::new(Some(server.url()), 20, 30, 60).unwrap();
        let request = ProxyRequest::new(Method::PUT, "/api/v2/files", Bytes::from(raw));
        client.forward(request, &token()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forward_error_status_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/missing")
            .with_status(404)
            .with_body("not json at all")
            .create_async()
            .await;

        let client = GenesysHttpClient::new(Some(server.url()), 20, 30, 60).unwrap();
        let request = ProxyRequest::new(Method::GET, "/api/v2/missing", Bytes::new());
        let response = client.forward(request, &token()).await.unwrap();

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, json!({}));
    }

    #[tokio::test]
    async fn test_forward_connection_refused() {
        let client =
            GenesysHttpClient::new(Some("http://127.0.0.1:1".to_string()), 20, 30, 60).unwrap();
        let request = ProxyRequest::new(Method::GET, "/api/v2/users", Bytes::new());
        let err = client.forward(request, &token()).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
}
