// Token fetch via the OAuth2 client-credentials grant

use chrono::Utc;
use reqwest::Client;

use super::types::{CachedToken, ClientCredentialsResponse, Credentials, TokenError};

/// Get the identity base URL for a region
pub fn login_base_url(region: &str) -> String {
    format!("https://login.{}", region)
}

/// Get the token endpoint under an identity base URL
pub fn token_url(login_base: &str) -> String {
    format!("{}/oauth/token", login_base)
}

/// Classify a transport error for logging
pub(crate) fn error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}

/// Request a new access token from the identity endpoint
pub async fn fetch_client_credentials(
    client: &Client,
    login_base: &str,
    creds: &Credentials,
) -> Result<CachedToken, TokenError> {
    let url = token_url(login_base);

    tracing::debug!(
        url = %url,
        region = %creds.region,
        "Requesting Genesys token via client credentials"
    );

    let response = client
        .post(&url)
        .basic_auth(&creds.client_id, Some(&creds.client_secret))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("grant_type=client_credentials")
        .send()
        .await
        .map_err(|e| {
            tracing::error!(
                error_kind = error_kind(&e),
                error = %e,
                url = %url,
                "Genesys token request failed"
            );
            TokenError::Network(e)
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            body = %body,
            "Genesys OAuth rejected token request"
        );
        return Err(TokenError::UpstreamAuth {
            status: status.as_u16(),
            body,
        });
    }

    let data: ClientCredentialsResponse = response.json().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to parse Genesys token response");
        TokenError::Network(e)
    })?;

    let token = CachedToken::issued_at(data.access_token, data.expires_in, Utc::now());

    tracing::info!(
        "Genesys token refreshed, expires: {}",
        token.expires_at.to_rfc3339()
    );

    Ok(token)
}
