//! Credential store abstraction
//!
//! The client treats credential storage as an opaque key-value concern:
//! it only ever reads, replaces, or clears the current [`TokenPair`].
//! Implementations serialize access internally so a reader always sees
//! the latest committed pair, never a partial update.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::types::TokenPair;

/// Trait for credential storage
///
/// All operations are infallible; a backend that can fail (keychain,
/// disk) is expected to degrade to "no tokens" rather than surface
/// storage errors into the request path.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Current token pair, or `None` when not authenticated
    async fn get(&self) -> Option<TokenPair>;

    /// Replace the stored pair atomically
    async fn set(&self, tokens: TokenPair);

    /// Remove both tokens atomically (logout)
    async fn clear(&self);

    /// Convenience accessor for the current access token
    async fn access_token(&self) -> Option<String> {
        self.get().await.map(|tokens| tokens.access)
    }
}

/// In-memory credential store
///
/// Default backend for the client; persistence-backed stores plug in
/// behind the same [`TokenStore`] trait.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<Option<TokenPair>>,
}

impl InMemoryTokenStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a pair (post-login)
    #[must_use]
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self { tokens: RwLock::new(Some(tokens)) }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self) -> Option<TokenPair> {
        self.tokens.read().await.clone()
    }

    async fn set(&self, tokens: TokenPair) {
        *self.tokens.write().await = Some(tokens);
    }

    async fn clear(&self) {
        *self.tokens.write().await = None;
    }
}
