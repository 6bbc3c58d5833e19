// Process-wide token cache

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::types::CachedToken;

/// Holds at most one bearer token.
///
/// The lock is only held for the read or the overwrite itself, never across
/// a network call, so concurrent refreshes race and the last write wins.
#[derive(Default)]
pub struct TokenCache {
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token if it is still outside the expiry buffer
    pub async fn get_valid(&self, now: DateTime<Utc>) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|cached| cached.is_valid_at(now))
            .map(|cached| cached.token.clone())
    }

    /// Overwrite the cached token
    pub async fn store(&self, token: CachedToken) {
        let mut slot = self.slot.write().await;
        *slot = Some(token);
    }

    /// Snapshot of the current entry, stale or not
    pub async fn current(&self) -> Option<CachedToken> {
        self.slot.read().await.clone()
    }

    pub async fn clear(&self) {
        self.slot.write().await.take();
    }
}
