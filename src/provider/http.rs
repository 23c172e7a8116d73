//! JSON-RPC wallet reached over HTTP.
//!
//! Talks to a wallet bridge (or a development node holding unlocked
//! accounts) that exposes the EIP-1193 methods as plain JSON-RPC 2.0.
//! HTTP cannot push, so the bridge delivers account and chain changes to
//! the API, which forwards them into this wallet's [`EventHub`].

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EventHub, ProviderRpcError, Subscription, WalletProvider};
use crate::error::DnaIdentityError;

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ProviderRpcError>,
}

/// EIP-1193 provider backed by an HTTP JSON-RPC endpoint.
pub struct HttpWallet {
    client: Client,
    url: String,
    next_id: AtomicU64,
    events: EventHub,
}

impl HttpWallet {
    /// Create a wallet client for the given endpoint.
    ///
    /// No request timeout is set: prompting methods wait for the user.
    pub fn new(url: impl Into<String>) -> crate::Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| DnaIdentityError::Provider(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
            events: EventHub::new(),
        })
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Hub through which pushed wallet events are delivered.
    pub fn events(&self) -> EventHub {
        self.events.clone()
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        tracing::debug!(id, method, "wallet request");

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderRpcError::internal(format!("request failed: {}", e)))?;

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderRpcError::invalid_response(method, e))?;

        if let Some(err) = body.error {
            tracing::debug!(id, method, code = err.code, "wallet request failed");
            return Err(err);
        }

        Ok(body.result.unwrap_or(Value::Null))
    }
}

impl WalletProvider for HttpWallet {
    fn request<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<Value, ProviderRpcError>> {
        self.send(method, params).boxed()
    }

    fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }
}
