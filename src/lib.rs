//! # dna-identity
//!
//! Wallet session and network-consistency layer for DNA identity NFTs.
//!
//! A [`WalletSession`] mediates every interaction with the user's wallet
//! provider: it resolves the authorized account and the active chain,
//! enforces the required network, and hands out contract handles bound to
//! the current account. The [`dna`] consumers mint, list and verify tokens
//! through those handles, and the [`api`] module serves all of it over HTTP
//! and WebSocket.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dna_identity::provider::{MemoryWallet, WalletProvider};
//! use dna_identity::{ChainId, ChainMetadata, SessionConfig, WalletSession};
//!
//! #[tokio::main]
//! async fn main() -> dna_identity::Result<()> {
//!     dna_identity::logging::try_init().ok();
//!
//!     let contract = "0x5fbdb2315678afecb367f032d93f642f64180aa3".parse()?;
//!     let wallet: Arc<dyn WalletProvider> =
//!         Arc::new(MemoryWallet::demo(contract, ChainId::SEPOLIA)?);
//!
//!     let session = WalletSession::new(
//!         SessionConfig::new(contract, ChainMetadata::sepolia()),
//!         Some(wallet),
//!     );
//!     let _listener = session.listen();
//!
//!     let snapshot = session.connect().await?;
//!     println!("connected as {:?}", snapshot.account());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod contract;
pub mod dna;
pub mod error;
pub mod logging;
pub mod provider;
pub mod security;
pub mod session;

pub use contract::DnaIdentityContract;
pub use error::{DnaIdentityError, Result};
pub use provider::{ProviderEvent, ProviderRpcError, WalletProvider};
pub use session::{
    Address, ChainId, ChainMetadata, ProviderListener, Session, SessionConfig, SessionState,
    SessionView, WalletSession,
};
