// Authentication module
// Manages the Genesys token lifecycle: acquire, reuse, expire, refresh

mod cache;
mod manager;
mod refresh;
mod types;

pub use cache::TokenCache;
pub use manager::TokenProvider;
pub use types::{AccessToken, CachedToken, TokenError, EXPIRY_BUFFER_MS};

pub(crate) use refresh::error_kind;
