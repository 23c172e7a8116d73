//! API layer for dna-identity.
//!
//! This module exposes the wallet session and its consumers over REST and
//! WebSocket endpoints.
//!
//! ## Endpoints
//!
//! ### Health & Info
//! - `GET /health` - Health check
//! - `GET /api/v1/` - API information
//!
//! ### Session
//! - `GET /api/v1/session` - Current session snapshot
//! - `POST /api/v1/session/connect` - Request account authorization
//! - `POST /api/v1/session/disconnect` - Forget the resolved account
//! - `POST /api/v1/session/sync` - Silent resync with the wallet
//! - `POST /api/v1/session/switch-network` - Move the wallet to the required chain
//! - `WS /api/v1/session/ws` - Session change stream
//! - `POST /api/v1/provider/events` - Push a wallet event
//!
//! ### Tokens
//! - `GET /api/v1/tokens` - Tokens owned by the session account
//! - `GET /api/v1/tokens/{id}` - Token details
//! - `POST /api/v1/tokens` - Mint a token
//! - `POST /api/v1/verify` - Verify a DNA hash against a token
//!
//! ## Security
//!
//! With API keys configured every route but `/health` needs
//! `Authorization: Bearer <key>`. Browser callers must come from a listed
//! origin to change state or open the session socket.

pub mod handlers;
pub mod router;
pub mod types;
pub mod websocket;

pub use handlers::AppState;
pub use router::{
    create_router, create_router_with_security, serve, serve_with_shutdown, ServerConfig,
};
pub use types::{ErrorResponse, EventAck, TokenListResponse, WsMessage, WsRequest};
