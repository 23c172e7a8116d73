//! Error types for dna-identity.

use thiserror::Error;

use crate::provider::ProviderRpcError;
use crate::session::{ChainId, SessionState};

/// Main error type for dna-identity operations.
#[derive(Error, Debug)]
pub enum DnaIdentityError {
    /// No wallet provider is present in the host.
    #[error("no wallet provider available: install or configure an Ethereum wallet")]
    ProviderUnavailable,

    /// The user declined an authorization, switch or add-network prompt.
    #[error("request rejected by user: {0}")]
    UserRejected(String),

    /// The wallet does not know the requested chain.
    #[error("chain {0} is not configured in the wallet")]
    UnrecognizedChain(ChainId),

    /// Opaque failure reported by the wallet transport.
    #[error("provider error: {0}")]
    Provider(String),

    /// A contract read or write failed.
    #[error("contract call failed: {0}")]
    ContractCall(String),

    /// An operation needed a connected session.
    #[error("wallet not connected")]
    NotConnected,

    /// An operation needed the session to be on the required chain.
    #[error("wrong network: connected to {current:?}, expected {required}")]
    WrongNetwork {
        current: Option<ChainId>,
        required: ChainId,
    },

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: SessionState,
        to: SessionState,
    },

    /// A string could not be parsed as a 20-byte address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Caller-supplied input was rejected before reaching the ledger.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A background session task panicked or was aborted.
    #[error("session task failed: {0}")]
    Task(String),
}

impl From<ProviderRpcError> for DnaIdentityError {
    fn from(err: ProviderRpcError) -> Self {
        if err.is_user_rejection() {
            Self::UserRejected(err.message)
        } else {
            Self::Provider(err.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for DnaIdentityError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

/// Convenience Result type for dna-identity operations.
pub type Result<T> = std::result::Result<T, DnaIdentityError>;
