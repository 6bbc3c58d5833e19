use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;

use super::cache::TokenCache;
use super::refresh;
use super::types::{AccessToken, Credentials, TokenError};
use crate::config::{non_empty, GenesysSettings};

/// Token provider
/// Hands out the cached bearer token and fetches a new one when it is absent or stale
pub struct TokenProvider {
    /// Upstream account settings
    settings: GenesysSettings,

    /// Shared token cache
    cache: Arc<TokenCache>,

    /// HTTP client for token requests
    client: Client,
}

impl TokenProvider {
    /// Create a provider on top of a shared HTTP client
    pub fn with_client(settings: GenesysSettings, cache: Arc<TokenCache>, client: Client) -> Self {
        Self {
            settings,
            cache,
            client,
        }
    }

    /// Resolve the credentials for a token fetch
    fn credentials(&self) -> Result<Credentials, TokenError> {
        let client_id = non_empty(&self.settings.client_id)
            .ok_or_else(|| TokenError::Configuration("GENESYS_CLIENT_ID is not set".to_string()))?;
        let client_secret = non_empty(&self.settings.client_secret).ok_or_else(|| {
            TokenError::Configuration("GENESYS_CLIENT_SECRET is not set".to_string())
        })?;

        Ok(Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            region: self.settings.region.clone(),
        })
    }

    /// Identity base URL, honoring the configured override
    fn login_base(&self) -> String {
        self.settings
            .login_url
            .clone()
            .unwrap_or_else(|| refresh::login_base_url(&self.settings.region))
    }

    /// Get a valid access token, fetching a new one if the cache is empty or stale
    ///
    /// Concurrent callers that all see a stale cache each fetch their own token.
    pub async fn acquire_token(&self) -> Result<AccessToken, TokenError> {
        let creds = self.credentials()?;

        if let Some(token) = self.cache.get_valid(Utc::now()).await {
            tracing::debug!("Using cached Genesys token");
            return Ok(AccessToken {
                token,
                region: creds.region,
            });
        }

        let fresh = refresh::fetch_client_credentials(&self.client, &self.login_base(), &creds).await?;
        let token = fresh.token.clone();
        self.cache.store(fresh).await;

        Ok(AccessToken {
            token,
            region: creds.region,
        })
    }

    /// Drop the cached token so the next call fetches a new one
    pub async fn invalidate(&self) {
        tracing::debug!("Invalidating cached Genesys token");
        self.cache.clear().await;
    }

    pub fn has_credentials(&self) -> bool {
        self.settings.has_credentials()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::CachedToken;
    use chrono::Duration;

    fn settings(login_url: &str) -> GenesysSettings {
        GenesysSettings {
            client_id: Some("test-client".to_string()),
            client_secret: Some("test-secret".to_string()),
            region: "mec1.pure.cloud".to_string(),
            login_url: Some(login_url.to_string()),
            api_url: None,
        }
    }

    fn provider(settings: GenesysSettings, cache: Arc<TokenCache>) -> TokenProvider {
        TokenProvider::with_client(settings, cache, Client::new())
    }

    #[tokio::test]
    async fn test_cached_token_skips_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"T","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let provider = provider(settings(&server.url()), Arc::new(TokenCache::new()));

        for _ in 0..5 {
            let token = provider.acquire_token().await.unwrap();
            assert_eq!(token.token, "T");
            assert_eq!(token.region, "mec1.pure.cloud");
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_stale_token_is_refetched_every_call() {
        let mut server = mockito::Server::new_async().await;
        // Lifetime shorter than the expiry buffer: stale as soon as it is stored
        let mock = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"short","expires_in":30}"#)
            .expect(3)
            .create_async()
            .await;

        let provider = provider(settings(&server.url()), Arc::new(TokenCache::new()));
        for _ in 0..3 {
            provider.acquire_token().await.unwrap();
        }

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_seed_triggers_single_fetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"new","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let cache = Arc::new(TokenCache::new());
        cache
            .store(CachedToken::issued_at(
                "old".to_string(),
                3600,
                Utc::now() - Duration::hours(2),
            ))
            .await;

        let provider = provider(settings(&server.url()), cache.clone());
        assert_eq!(provider.acquire_token().await.unwrap().token, "new");
        assert_eq!(provider.acquire_token().await.unwrap().token, "new");

        mock.assert_async().await;
        assert_eq!(cache.current().await.unwrap().token, "new");
    }

    #[tokio::test]
    async fn test_missing_client_id_fails_before_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .expect(0)
            .create_async()
            .await;

        let mut s = settings(&server.url());
        s.client_id = None;
        let err = provider(s, Arc::new(TokenCache::new()))
            .acquire_token()
            .await
            .unwrap_err();

        assert!(matches!(err, TokenError::Configuration(_)));
        assert!(err.to_string().contains("GENESYS_CLIENT_ID"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_secret_fails_even_with_cached_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .expect(0)
            .create_async()
            .await;

        let cache = Arc::new(TokenCache::new());
        cache
            .store(CachedToken::issued_at("cached".to_string(), 3600, Utc::now()))
            .await;

        let mut s = settings(&server.url());
        s.client_secret = Some(String::new());
        let err = provider(s, cache).acquire_token().await.unwrap_err();

        assert!(matches!(err, TokenError::Configuration(_)));
        assert!(err.to_string().contains("GENESYS_CLIENT_SECRET"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejection_leaves_cache_untouched() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/token")
            .with_status(400)
            .with_body("bad request")
            .create_async()
            .await;

        let cache = Arc::new(TokenCache::new());
        let provider = provider(settings(&server.url()), cache.clone());
        let err = provider.acquire_token().await.unwrap_err();

        assert!(matches!(err, TokenError::UpstreamAuth { status: 400, .. }));
        assert!(cache.current().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"T","expires_in":3600}"#)
            .expect(2)
            .create_async()
            .await;

        let provider = provider(settings(&server.url()), Arc::new(TokenCache::new()));
        provider.acquire_token().await.unwrap();
        provider.invalidate().await;
        provider.acquire_token().await.unwrap();

        mock.assert_async().await;
    }

    #[test]
    fn test_default_login_base_uses_region() {
        let mut s = settings("http://unused");
        s.login_url = None;
        let provider = provider(s, Arc::new(TokenCache::new()));
        assert_eq!(provider.login_base(), "https://login.mec1.pure.cloud");
        assert!(provider.has_credentials());
    }
}
