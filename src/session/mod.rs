//! Wallet session.
//!
//! This module owns the connection state machine: account identity, active
//! network, the snapshot published to consumers, and the service that keeps
//! it in step with the wallet provider.

mod address;
mod chain;
mod state;
mod store;
mod wallet;

pub use address::Address;
pub use chain::{ChainId, ChainMetadata, NativeCurrency};
pub use state::SessionState;
pub use store::{Session, SessionConfig, SessionStore, SessionView};
pub use wallet::{ProviderListener, WalletSession};
