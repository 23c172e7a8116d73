//! API router configuration.

use std::future::Future;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{
    api_info, connect, disconnect, get_session, get_token, health, list_tokens, mint_token,
    provider_event, switch_network, sync, verify_token, AppState,
};
use super::websocket::ws_handler;
use crate::error::DnaIdentityError;
use crate::security::{auth_middleware, origin_middleware, SecurityConfig};

/// Create the API router with development security: no API key, and no
/// cross-origin browser callers.
pub fn create_router(state: AppState) -> Router {
    create_router_with_security(state, &SecurityConfig::development())
}

/// Create the API router guarded by `security`.
pub fn create_router_with_security(state: AppState, security: &SecurityConfig) -> Router {
    let session_routes = Router::new()
        .route("/", get(get_session))
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
        .route("/sync", post(sync))
        .route("/switch-network", post(switch_network))
        .route("/ws", any(ws_handler));

    let token_routes = Router::new()
        .route("/", get(list_tokens).post(mint_token))
        .route("/{id}", get(get_token));

    let api_v1 = Router::new()
        .route("/", get(api_info))
        .route("/verify", post(verify_token))
        .route("/provider/events", post(provider_event))
        .nest("/session", session_routes)
        .nest("/tokens", token_routes);

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .layer(middleware::from_fn_with_state(
            Arc::new(security.key_store()),
            auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            Arc::new(security.origins.clone()),
            origin_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(security.origins.cors_layer())
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Authentication and origin policy.
    pub security: SecurityConfig,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            security: SecurityConfig::development(),
        }
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 3000)
    }
}

/// Start the API server.
pub async fn serve(config: ServerConfig, state: AppState) -> crate::Result<()> {
    serve_with_shutdown(config, state, std::future::pending()).await
}

/// Start the API server, stopping gracefully when `shutdown` completes.
pub async fn serve_with_shutdown<F>(
    config: ServerConfig,
    state: AppState,
    shutdown: F,
) -> crate::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.bind_address();
    let router = create_router_with_security(state, &config.security);

    tracing::info!(
        auth = config.security.auth.enabled,
        origins = config.security.origins.origins().len(),
        "Starting dna-identity API server on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(DnaIdentityError::Io)?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| DnaIdentityError::Io(std::io::Error::other(e.to_string())))?;

    Ok(())
}
