//! Persisted credentials.

use std::sync::RwLock;

use crate::models::TokenPair;

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key of the preferred AI model identifier.
pub const SELECTED_MODEL_KEY: &str = "selectedModel";

/// Where the client keeps its token pair. Browser `localStorage` in the
/// frontend, a JSON file in the CLI.
pub trait TokenStore {
    /// Stored pair, if any.
    fn load(&self) -> Option<TokenPair>;
    /// Replace the stored pair.
    fn save(&self, tokens: &TokenPair);
    /// Forget both tokens.
    fn clear(&self);

    /// Stored bearer token.
    fn access_token(&self) -> Option<String> {
        self.load().map(|pair| pair.token)
    }

    /// Stored refresh token.
    fn refresh_token(&self) -> Option<String> {
        self.load().and_then(|pair| pair.refresh_token)
    }
}

/// Process-local store, used by tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `tokens`.
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }

    fn replace(&self, next: Option<TokenPair>) {
        match self.tokens.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<TokenPair> {
        match self.tokens.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn save(&self, tokens: &TokenPair) {
        self.replace(Some(tokens.clone()));
    }

    fn clear(&self) {
        self.replace(None);
    }
}
