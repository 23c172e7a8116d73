//! REST API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::types::{ErrorResponse, EventAck, TokenListResponse};
use crate::dna::{self, DnaToken, MintReceipt, MintRequest, VerificationReport, VerifyRequest};
use crate::error::DnaIdentityError;
use crate::provider::{EventHub, ProviderEvent};
use crate::session::{SessionView, WalletSession};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: DnaIdentityError) -> ApiError {
    let (status, body) = ErrorResponse::from_error(&err);
    if status.is_server_error() {
        tracing::warn!(error = %err, "request failed");
    }
    (status, Json(body))
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub session: WalletSession,
    /// Hub that pushed provider events are delivered to.
    pub events: Option<EventHub>,
}

impl AppState {
    pub fn new(session: WalletSession) -> Self {
        Self {
            session,
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventHub) -> Self {
        self.events = Some(events);
        self
    }
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.session.config();
    Json(serde_json::json!({
        "name": "dna-identity",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "contract_address": config.contract_address,
        "required_chain_id": config.required_chain_id(),
        "network_name": config.network.chain_name,
        "wallet_present": state.session.has_provider(),
    }))
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.session.snapshot().view())
}

/// Ask the wallet to authorize an account.
pub async fn connect(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let session = state.session.connect().await.map_err(api_error)?;
    Ok(Json(session.view()))
}

pub async fn disconnect(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let session = state.session.disconnect().map_err(api_error)?;
    Ok(Json(session.view()))
}

/// Silent resync with the wallet.
pub async fn sync(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let session = state.session.initialize().await.map_err(api_error)?;
    Ok(Json(session.view()))
}

pub async fn switch_network(
    State(state): State<AppState>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session.switch_network().await.map_err(api_error)?;
    Ok(Json(session.view()))
}

/// Deliver a wallet event pushed by a wallet bridge.
pub async fn provider_event(
    State(state): State<AppState>,
    Json(event): Json<ProviderEvent>,
) -> Result<Json<EventAck>, ApiError> {
    let hub = state
        .events
        .as_ref()
        .ok_or_else(|| api_error(DnaIdentityError::ProviderUnavailable))?;
    Ok(Json(EventAck {
        delivered: hub.emit(event),
    }))
}

/// Tokens owned by the session account.
pub async fn list_tokens(
    State(state): State<AppState>,
) -> Result<Json<TokenListResponse>, ApiError> {
    let tokens = dna::owned_tokens(&state.session).await.map_err(api_error)?;
    Ok(Json(TokenListResponse {
        count: tokens.len(),
        tokens,
    }))
}

pub async fn get_token(
    State(state): State<AppState>,
    Path(token_id): Path<u64>,
) -> Result<Json<DnaToken>, ApiError> {
    let token = dna::token_details(&state.session, token_id)
        .await
        .map_err(api_error)?;
    Ok(Json(token))
}

/// Mint a token and wait until it is mined.
pub async fn mint_token(
    State(state): State<AppState>,
    Json(req): Json<MintRequest>,
) -> Result<(StatusCode, Json<MintReceipt>), ApiError> {
    let receipt = dna::mint(&state.session, &req).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn verify_token(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerificationReport>, ApiError> {
    let report = dna::verify(&state.session, &req).await.map_err(api_error)?;
    Ok(Json(report))
}
