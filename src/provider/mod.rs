//! Wallet provider abstraction.
//!
//! A wallet provider is the agent holding the user's keys: a browser-style
//! injected wallet, a wallet bridge reachable over HTTP, or an in-process
//! test wallet. All of them speak the EIP-1193 shape: one `request` entry
//! point taking a JSON-RPC method and parameters, plus push events for
//! account and chain changes.
//!
//! The typed helpers on `dyn WalletProvider` cover the handful of methods the
//! session and the contract handle need.

mod events;
mod http;
mod memory;

pub use events::{EventHub, ProviderEvent, Subscription};
pub use http::HttpWallet;
pub use memory::{MemoryWallet, PromptGate};

use alloy_primitives::{Bytes, B256};
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::session::{Address, ChainId, ChainMetadata};

/// User rejected the request (EIP-1193).
pub const USER_REJECTED: i64 = 4001;
/// The requested account or method has not been authorized.
pub const UNAUTHORIZED: i64 = 4100;
/// The provider does not support the method.
pub const UNSUPPORTED_METHOD: i64 = 4200;
/// The wallet does not know the requested chain (EIP-3326).
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// Invalid method parameters (JSON-RPC).
pub const INVALID_PARAMS: i64 = -32602;
/// Internal or transport failure (JSON-RPC).
pub const INTERNAL_ERROR: i64 = -32603;
/// Execution reverted.
pub const EXECUTION_REVERTED: i64 = 3;

/// Error object returned by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("provider error {code}: {message}")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::new(USER_REJECTED, message)
    }

    pub fn unrecognized_chain(chain_id: ChainId) -> Self {
        Self::new(
            UNRECOGNIZED_CHAIN,
            format!("Unrecognized chain ID \"{}\"", chain_id.to_hex()),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn invalid_response(method: &str, detail: impl std::fmt::Display) -> Self {
        Self::internal(format!("invalid response to {}: {}", method, detail))
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == UNRECOGNIZED_CHAIN
    }
}

/// An EIP-1193 wallet provider.
pub trait WalletProvider: Send + Sync {
    /// Issue a JSON-RPC request. Prompting methods may stay pending for as
    /// long as the user leaves the wallet prompt open.
    fn request<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<Value, ProviderRpcError>>;

    /// Subscribe to account and chain change notifications.
    ///
    /// Dropping the returned subscription unsubscribes.
    fn subscribe(&self) -> Subscription;
}

/// Call object for `eth_call` and `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

impl TransactionRequest {
    pub fn new(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from,
            to,
            data: data.into(),
        }
    }
}

/// A log entry in a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    /// `0x1` on success, `0x0` when reverted.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        !matches!(self.status.as_deref(), Some("0x0"))
    }
}

fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, ProviderRpcError> {
    serde_json::from_value(value).map_err(|e| ProviderRpcError::invalid_response(method, e))
}

impl dyn WalletProvider {
    /// Accounts already authorized for this application. Never prompts.
    pub async fn accounts(&self) -> Result<Vec<Address>, ProviderRpcError> {
        let value = self.request("eth_accounts", json!([])).await?;
        decode("eth_accounts", value)
    }

    /// Ask the user to authorize accounts. May prompt.
    pub async fn request_accounts(&self) -> Result<Vec<Address>, ProviderRpcError> {
        let value = self.request("eth_requestAccounts", json!([])).await?;
        decode("eth_requestAccounts", value)
    }

    /// Chain the wallet is currently on.
    pub async fn chain_id(&self) -> Result<ChainId, ProviderRpcError> {
        let value = self.request("eth_chainId", json!([])).await?;
        decode("eth_chainId", value)
    }

    /// Ask the wallet to change its active chain. May prompt.
    pub async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderRpcError> {
        self.request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain_id.to_hex() }]),
        )
        .await?;
        Ok(())
    }

    /// Ask the wallet to add a chain it does not know. May prompt.
    pub async fn add_chain(&self, metadata: &ChainMetadata) -> Result<(), ProviderRpcError> {
        self.request(
            "wallet_addEthereumChain",
            json!([metadata.to_add_chain_params()]),
        )
        .await?;
        Ok(())
    }

    /// Execute a read-only call against the latest block.
    pub async fn call(&self, tx: &TransactionRequest) -> Result<Bytes, ProviderRpcError> {
        let value = self.request("eth_call", json!([tx, "latest"])).await?;
        decode("eth_call", value)
    }

    /// Submit a transaction for the wallet to sign and broadcast. May prompt.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, ProviderRpcError> {
        let value = self.request("eth_sendTransaction", json!([tx])).await?;
        decode("eth_sendTransaction", value)
    }

    /// Receipt for a transaction, or `None` while it is still pending.
    pub async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, ProviderRpcError> {
        let value = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        decode("eth_getTransactionReceipt", value)
    }
}
