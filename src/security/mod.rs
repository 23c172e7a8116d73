//! Security module for dna-identity.
//!
//! The API can sign and send transactions from the user's wallet, so every
//! request passes two checks:
//!
//! - **API key authentication**: Bearer token, enabled when keys are configured
//! - **Origin policy**: browser requests from unlisted origins may not change state

pub mod auth;
pub mod origin;

pub use auth::{auth_middleware, ApiKeyStore, AuthConfig};
pub use origin::{origin_middleware, OriginPolicy};

/// Combined security settings for the API server.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub auth: AuthConfig,
    pub api_keys: Vec<String>,
    pub origins: OriginPolicy,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl SecurityConfig {
    /// No authentication and no cross-origin callers.
    pub fn development() -> Self {
        Self {
            auth: AuthConfig::disabled(),
            api_keys: Vec::new(),
            origins: OriginPolicy::default(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.auth.enabled = true;
        self.api_keys.push(key.into());
        self
    }

    pub fn with_origins(mut self, origins: OriginPolicy) -> Self {
        self.origins = origins;
        self
    }

    /// Key store loaded with the configured keys.
    pub fn key_store(&self) -> ApiKeyStore {
        let store = ApiKeyStore::new(self.auth.clone());
        for key in &self.api_keys {
            store.add_key(key.clone());
        }
        store
    }
}
