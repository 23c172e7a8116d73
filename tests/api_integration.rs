//! API integration tests.
//!
//! These tests drive the full router against the in-memory wallet using
//! axum's test utilities.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use dna_identity::api::{create_router, create_router_with_security, AppState};
use dna_identity::provider::{MemoryWallet, ProviderRpcError, WalletProvider};
use dna_identity::security::{OriginPolicy, SecurityConfig};
use dna_identity::{Address, ChainId, ChainMetadata, SessionConfig, SessionState, WalletSession};
use serde_json::{json, Value};
use tower::ServiceExt;

const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
const ACCOUNT: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
const OTHER: &str = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc";

struct TestApp {
    wallet: Arc<MemoryWallet>,
    session: WalletSession,
    router: Router,
}

fn setup(chain_id: ChainId) -> TestApp {
    setup_with_security(chain_id, SecurityConfig::development())
}

fn setup_with_security(chain_id: ChainId, security: SecurityConfig) -> TestApp {
    let wallet = Arc::new(MemoryWallet::new(CONTRACT.parse().unwrap(), chain_id));
    wallet.add_account(ACCOUNT.parse().unwrap());
    let provider: Arc<dyn WalletProvider> = wallet.clone();

    let mut config = SessionConfig::new(CONTRACT.parse().unwrap(), ChainMetadata::sepolia());
    config.receipt_poll_interval = Duration::from_millis(5);

    let session = WalletSession::new(config, Some(provider));
    let state = AppState::new(session.clone()).with_events(wallet.events());

    TestApp {
        wallet,
        session,
        router: create_router_with_security(state, &security),
    }
}

/// Helper to create a JSON request.
fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Helper to extract body as string.
async fn response_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).to_string()
}

/// Helper to extract JSON from response.
async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

async fn call(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app
        .router
        .clone()
        .oneshot(json_request(method, uri, body))
        .await
        .unwrap();
    let status = response.status();
    (status, response_json(response).await)
}

async fn wait_for_state(session: &WalletSession, state: SessionState) {
    let mut rx = session.subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if rx.borrow_and_update().state() == state {
                return;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("session did not reach expected state");
}

// ============================================================================
// Health & Info Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup(ChainId::SEPOLIA);

    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_text(response).await, "OK");
}

#[tokio::test]
async fn test_api_info_endpoint() {
    let app = setup(ChainId::SEPOLIA);

    let (status, json) = call(&app, Method::GET, "/api/v1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "dna-identity");
    assert_eq!(json["status"], "running");
    assert_eq!(json["required_chain_id"], 11155111);
    assert_eq!(json["contract_address"], CONTRACT);
    assert_eq!(json["wallet_present"], true);
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_initial_session_is_disconnected() {
    let app = setup(ChainId::SEPOLIA);

    let (status, json) = call(&app, Method::GET, "/api/v1/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "disconnected");
    assert_eq!(json["connected"], false);
    assert!(json["account"].is_null());
    assert_eq!(json["is_correct_network"], false);
}

#[tokio::test]
async fn test_connect_and_disconnect() {
    let app = setup(ChainId::SEPOLIA);

    let (status, json) = call(&app, Method::POST, "/api/v1/session/connect", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "connected");
    assert_eq!(json["account"], ACCOUNT);
    assert_eq!(json["chain_id"], 11155111);
    assert_eq!(json["is_correct_network"], true);
    assert_eq!(json["contract_address"], CONTRACT);

    let (status, json) = call(&app, Method::POST, "/api/v1/session/disconnect", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "disconnected");
    assert!(json["account"].is_null());
    assert!(json["contract_address"].is_null());
}

#[tokio::test]
async fn test_connect_rejected() {
    let app = setup(ChainId::SEPOLIA);
    app.wallet.fail_next(
        "eth_requestAccounts",
        ProviderRpcError::user_rejected("User rejected the request."),
    );

    let (status, json) = call(&app, Method::POST, "/api/v1/session/connect", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "USER_REJECTED");

    let (_, json) = call(&app, Method::GET, "/api/v1/session", None).await;
    assert_eq!(json["state"], "disconnected");
}

#[tokio::test]
async fn test_connect_without_wallet() {
    let config = SessionConfig::new(CONTRACT.parse().unwrap(), ChainMetadata::sepolia());
    let router = create_router(AppState::new(WalletSession::new(config, None)));

    let response = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/session/connect", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response_json(response).await["code"], "PROVIDER_UNAVAILABLE");

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/provider/events",
            Some(json!({"event": "accounts_changed", "accounts": []})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_sync_picks_up_authorized_account() {
    let app = setup(ChainId::SEPOLIA);
    app.wallet.authorize();

    let (status, json) = call(&app, Method::POST, "/api/v1/session/sync", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "connected");
    assert_eq!(app.wallet.request_count("eth_requestAccounts"), 0);
}

#[tokio::test]
async fn test_wrong_network_then_switch() {
    let app = setup(ChainId::MAINNET);

    let (_, json) = call(&app, Method::POST, "/api/v1/session/connect", None).await;
    assert_eq!(json["state"], "wrong_network");
    assert_eq!(json["network_name"], "Ethereum Mainnet");

    let (status, json) = call(&app, Method::GET, "/api/v1/tokens", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "WRONG_NETWORK");

    let (status, json) = call(&app, Method::POST, "/api/v1/session/switch-network", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["state"], "connected");
    assert_eq!(json["is_correct_network"], true);
    assert_eq!(app.wallet.request_count("wallet_addEthereumChain"), 1);
    assert_eq!(app.wallet.request_count("wallet_switchEthereumChain"), 2);
}

#[tokio::test]
async fn test_switch_network_add_rejected() {
    let app = setup(ChainId::MAINNET);
    call(&app, Method::POST, "/api/v1/session/connect", None).await;
    app.wallet.fail_next(
        "wallet_addEthereumChain",
        ProviderRpcError::user_rejected("User rejected the request."),
    );

    let (status, json) = call(&app, Method::POST, "/api/v1/session/switch-network", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "USER_REJECTED");
    assert_eq!(app.wallet.request_count("wallet_switchEthereumChain"), 1);

    let (_, json) = call(&app, Method::GET, "/api/v1/session", None).await;
    assert_eq!(json["state"], "wrong_network");
}

#[tokio::test]
async fn test_pushed_events_update_session() {
    let app = setup(ChainId::SEPOLIA);
    let _listener = app.session.listen().unwrap();
    call(&app, Method::POST, "/api/v1/session/connect", None).await;

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/provider/events",
        Some(json!({"event": "chain_changed", "chain_id": "0x1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["delivered"], 1);
    // The pushed event only reports the change; the resync reads the wallet.
    app.wallet.change_chain(ChainId::MAINNET);
    wait_for_state(&app.session, SessionState::WrongNetwork).await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/provider/events",
        Some(json!({"event": "accounts_changed", "accounts": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    wait_for_state(&app.session, SessionState::Disconnected).await;
}

#[tokio::test]
async fn test_malformed_event_rejected() {
    let app = setup(ChainId::SEPOLIA);
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/provider/events",
            Some(json!({"event": "disconnect"})),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

// ============================================================================
// Token Tests
// ============================================================================

#[tokio::test]
async fn test_tokens_require_connection() {
    let app = setup(ChainId::SEPOLIA);

    let (status, json) = call(&app, Method::GET, "/api/v1/tokens", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "NOT_CONNECTED");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({"token_id": 1, "dna_hash": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_mint_list_and_verify() {
    let app = setup(ChainId::SEPOLIA);
    call(&app, Method::POST, "/api/v1/session/connect", None).await;

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/tokens",
        Some(json!({
            "dna_hash": "9f86d081884c7d659a2feaa0c55ad015",
            "name": "Alice",
            "attributes": [
                {"trait_type": "Eye Color", "value": "Green"},
                {"trait_type": "", "value": "dropped"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["token_id"], 1);
    let tx_hash = json["tx_hash"].as_str().unwrap().to_string();
    assert!(tx_hash.starts_with("0x"));
    assert_eq!(tx_hash.len(), 66);
    assert_eq!(
        json["explorer_url"],
        format!("https://sepolia.etherscan.io/tx/{}", tx_hash)
    );

    let (status, json) = call(&app, Method::GET, "/api/v1/tokens", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["tokens"][0]["id"], 1);
    assert_eq!(json["tokens"][0]["owner"], ACCOUNT);

    let (status, json) = call(&app, Method::GET, "/api/v1/tokens/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["dna_hash"], "9f86d081884c7d659a2feaa0c55ad015");
    assert_eq!(json["metadata"]["name"], "Alice");
    assert_eq!(
        json["metadata"]["description"],
        "A DNA Identity NFT secured on the blockchain"
    );
    assert_eq!(json["metadata"]["attributes"].as_array().unwrap().len(), 1);
    assert_eq!(json["metadata"]["dna_hash"], "9f86d081884c7d659a2feaa0c55ad015");

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({"token_id": 1, "dna_hash": "9f86d081884c7d659a2feaa0c55ad015"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["matches"], true);
    assert_eq!(json["owner"], ACCOUNT);

    let (_, json) = call(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({"token_id": 1, "dna_hash": "deadbeef"})),
    )
    .await;
    assert_eq!(json["matches"], false);
    assert_eq!(json["stored_hash"], "9f86d081884c7d659a2feaa0c55ad015");
}

#[tokio::test]
async fn test_mint_waits_for_receipt() {
    let app = setup(ChainId::SEPOLIA);
    app.wallet.set_receipt_delay(3);
    call(&app, Method::POST, "/api/v1/session/connect", None).await;

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/tokens",
        Some(json!({"dna_hash": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["token_id"], 1);
    assert_eq!(app.wallet.request_count("eth_getTransactionReceipt"), 4);
}

#[tokio::test]
async fn test_mint_rejects_blank_hash() {
    let app = setup(ChainId::SEPOLIA);
    call(&app, Method::POST, "/api/v1/session/connect", None).await;

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/tokens",
        Some(json!({"dna_hash": "   ", "name": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_INPUT");
    assert_eq!(app.wallet.request_count("eth_sendTransaction"), 0);
}

#[tokio::test]
async fn test_mint_rejected_by_user() {
    let app = setup(ChainId::SEPOLIA);
    call(&app, Method::POST, "/api/v1/session/connect", None).await;
    app.wallet.fail_next(
        "eth_sendTransaction",
        ProviderRpcError::user_rejected("User denied transaction signature."),
    );

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/tokens",
        Some(json!({"dna_hash": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "USER_REJECTED");
}

#[tokio::test]
async fn test_gallery_only_lists_owned_tokens() {
    let app = setup(ChainId::SEPOLIA);
    let other: Address = OTHER.parse().unwrap();
    app.wallet.seed_token(other, "foreign", "ipfs://foreign");
    app.wallet.seed_token(ACCOUNT.parse().unwrap(), "mine", "ipfs://mine");
    call(&app, Method::POST, "/api/v1/session/connect", None).await;

    let (status, json) = call(&app, Method::GET, "/api/v1/tokens", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["tokens"][0]["id"], 2);
    assert_eq!(json["tokens"][0]["token_uri"], "ipfs://mine");
    assert_eq!(json["tokens"][0]["metadata"]["name"], "DNA Identity #2");
    assert_eq!(json["tokens"][0]["metadata"]["description"], "DNA Identity NFT");
}

#[tokio::test]
async fn test_gallery_empty_balance_skips_scan() {
    let app = setup(ChainId::SEPOLIA);
    app.wallet
        .seed_token(OTHER.parse().unwrap(), "foreign", "ipfs://foreign");
    call(&app, Method::POST, "/api/v1/session/connect", None).await;
    let calls_before = app.wallet.request_count("eth_call");

    let (status, json) = call(&app, Method::GET, "/api/v1/tokens", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 0);
    assert_eq!(app.wallet.request_count("eth_call"), calls_before + 1);
}

#[tokio::test]
async fn test_gallery_balance_failure() {
    let app = setup(ChainId::SEPOLIA);
    let me: Address = ACCOUNT.parse().unwrap();
    app.wallet.seed_token(me, "first", "{}");
    call(&app, Method::POST, "/api/v1/session/connect", None).await;

    app.wallet
        .fail_next("eth_call", ProviderRpcError::internal("node unavailable"));
    let (status, json) = call(&app, Method::GET, "/api/v1/tokens", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "CONTRACT_CALL_ERROR");
}

#[tokio::test]
async fn test_token_details_missing() {
    let app = setup(ChainId::SEPOLIA);
    call(&app, Method::POST, "/api/v1/session/connect", None).await;

    let (status, json) = call(&app, Method::GET, "/api/v1/tokens/42", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "CONTRACT_CALL_ERROR");
}

#[tokio::test]
async fn test_verify_requires_input() {
    let app = setup(ChainId::SEPOLIA);
    call(&app, Method::POST, "/api/v1/session/connect", None).await;

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({"dna_hash": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_INPUT");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({"token_id": 1, "dna_hash": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_padded_hash_round_trips() {
    let app = setup(ChainId::SEPOLIA);
    call(&app, Method::POST, "/api/v1/session/connect", None).await;

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/tokens",
        Some(json!({"dna_hash": " abc123 "})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["token_id"], 1);

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({"token_id": 1, "dna_hash": " abc123 "})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stored_hash"], " abc123 ");
    assert_eq!(json["matches"], true);
}

#[tokio::test]
async fn test_verify_token_zero_reaches_ledger() {
    let app = setup(ChainId::SEPOLIA);
    call(&app, Method::POST, "/api/v1/session/connect", None).await;
    let calls_before = app.wallet.request_count("eth_call");

    let (status, json) = call(
        &app,
        Method::POST,
        "/api/v1/verify",
        Some(json!({"token_id": 0, "dna_hash": "abc"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "CONTRACT_CALL_ERROR");
    assert!(app.wallet.request_count("eth_call") > calls_before);
}

// ============================================================================
// Security Tests
// ============================================================================

const FOREIGN_ORIGIN: &str = "https://evil.example";
const APP_ORIGIN: &str = "https://app.example";

#[tokio::test]
async fn test_preflight_from_unlisted_origin_not_allowed() {
    let app = setup(ChainId::SEPOLIA);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/tokens")
        .header(header::ORIGIN, FOREIGN_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_cross_origin_mint_refused() {
    let app = setup(ChainId::SEPOLIA);
    call(&app, Method::POST, "/api/v1/session/connect", None).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/tokens")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, FOREIGN_ORIGIN)
        .body(Body::from(json!({"dna_hash": "abc"}).to_string()))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.wallet.request_count("eth_sendTransaction"), 0);
}

#[tokio::test]
async fn test_cross_origin_event_and_socket_refused() {
    let app = setup(ChainId::SEPOLIA);
    let _listener = app.session.listen().unwrap();
    call(&app, Method::POST, "/api/v1/session/connect", None).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/provider/events")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, FOREIGN_ORIGIN)
        .body(Body::from(
            json!({"type": "accounts_changed", "accounts": []}).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.session.snapshot().state(), SessionState::Connected);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/session/ws")
        .header(header::ORIGIN, FOREIGN_ORIGIN)
        .header(header::CONNECTION, "upgrade")
        .header(header::UPGRADE, "websocket")
        .header(header::SEC_WEBSOCKET_VERSION, "13")
        .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_listed_origin_allowed() {
    let security = SecurityConfig::development()
        .with_origins(OriginPolicy::new([APP_ORIGIN]).unwrap());
    let app = setup_with_security(ChainId::SEPOLIA, security);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/session/connect")
        .header(header::ORIGIN, APP_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        APP_ORIGIN
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/session/connect")
        .header(header::ORIGIN, APP_ORIGIN)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        APP_ORIGIN
    );
}

#[tokio::test]
async fn test_api_key_required() {
    let security = SecurityConfig::development().with_api_key("secret");
    let app = setup_with_security(ChainId::SEPOLIA, security);

    let (status, _) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::POST, "/api/v1/session/connect", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.wallet.request_count("eth_requestAccounts"), 0);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/session/connect")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/session/connect")
        .header(header::AUTHORIZATION, "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.session.snapshot().state(), SessionState::Connected);
}

// ============================================================================
// WebSocket Tests
// ============================================================================

async fn next_frame<S>(ws: &mut S) -> Value
where
    S: futures_util::Stream<
            Item = Result<tokio_tungstenite::tungstenite::Message, tokio_tungstenite::tungstenite::Error>,
        > + Unpin,
{
    use futures_util::StreamExt;

    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("no websocket frame")
            .expect("socket closed")
            .unwrap();
        if msg.is_text() {
            return serde_json::from_str(msg.to_text().unwrap()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_session_websocket() {
    use futures_util::SinkExt;
    use tokio_tungstenite::tungstenite::Message;

    let app = setup(ChainId::SEPOLIA);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/api/v1/session/ws", addr))
        .await
        .unwrap();

    let initial = next_frame(&mut ws).await;
    assert_eq!(initial["type"], "session");
    assert_eq!(initial["session"]["state"], "disconnected");
    assert_eq!(initial["session"]["required_chain_id"], 11155111);

    app.session.connect().await.unwrap();
    loop {
        let frame = next_frame(&mut ws).await;
        assert_eq!(frame["type"], "session");
        if frame["session"]["state"] == "connected" {
            assert_eq!(frame["session"]["account"], ACCOUNT);
            break;
        }
    }

    ws.send(Message::text(json!({"type": "ping"}).to_string()))
        .await
        .unwrap();
    loop {
        let frame = next_frame(&mut ws).await;
        if frame["type"] == "pong" {
            break;
        }
        assert_eq!(frame["type"], "session");
    }

    ws.send(Message::text("not json".to_string())).await.unwrap();
    let frame = loop {
        let frame = next_frame(&mut ws).await;
        if frame["type"] != "session" {
            break frame;
        }
    };
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["code"], "PARSE_ERROR");
}
