// Authentication types

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Tokens are treated as stale this long before their real expiry
pub const EXPIRY_BUFFER_MS: i64 = 60_000;

/// Errors raised while acquiring an access token
#[derive(Error, Debug)]
pub enum TokenError {
    /// Client id or secret is not configured
    #[error("Genesys credentials not configured: {0}")]
    Configuration(String),

    /// Identity endpoint rejected the token request
    #[error("Genesys OAuth failed ({status}): {body}")]
    UpstreamAuth { status: u16, body: String },

    /// Transport failure talking to the identity endpoint
    #[error("Genesys OAuth request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Credential set resolved for a single token fetch
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub region: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("region", &self.region)
            .finish()
    }
}

/// Bearer token handed to callers together with the region it is valid for
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub token: String,
    pub region: String,
}

/// Token held in the process-wide cache
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Create a token that expires `expires_in` seconds from `now`
    pub fn issued_at(token: String, expires_in: i64, now: DateTime<Utc>) -> Self {
        let expires_in = expires_in.clamp(0, i64::from(i32::MAX));
        Self {
            token,
            expires_at: now + Duration::milliseconds(expires_in * 1000),
        }
    }

    /// Usable while `now < expires_at - EXPIRY_BUFFER_MS`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::milliseconds(EXPIRY_BUFFER_MS)
    }
}

/// client_credentials token response
#[derive(Deserialize)]
pub struct ClientCredentialsResponse {
    pub access_token: String,
    pub expires_in: i64,
}
