//! Session snapshots and their publication.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use super::{Address, ChainId, ChainMetadata, SessionState};
use crate::contract::{DnaIdentityContract, DEFAULT_RECEIPT_POLL_INTERVAL};
use crate::error::DnaIdentityError;
use crate::Result;

/// Configuration for a wallet session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Location of the DNA identity ledger contract.
    pub contract_address: Address,
    /// Required network, with the metadata used by the add-network fallback.
    pub network: ChainMetadata,
    /// Receipt polling interval for contract handles.
    pub receipt_poll_interval: Duration,
}

impl SessionConfig {
    pub fn new(contract_address: Address, network: ChainMetadata) -> Self {
        Self {
            contract_address,
            network,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
        }
    }

    pub fn required_chain_id(&self) -> ChainId {
        self.network.chain_id
    }
}

/// An immutable view of the wallet session.
///
/// Fields are private; the constructors are the only way to build one, so a
/// snapshot without an account never carries a contract handle.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    account: Option<Address>,
    chain_id: Option<ChainId>,
    required_chain_id: ChainId,
    contract: Option<DnaIdentityContract>,
    epoch: u64,
}

impl Session {
    /// Nothing resolved.
    pub fn disconnected(required_chain_id: ChainId, epoch: u64) -> Self {
        Self {
            state: SessionState::Disconnected,
            account: None,
            chain_id: None,
            required_chain_id,
            contract: None,
            epoch,
        }
    }

    /// An authorization prompt is pending.
    pub fn connecting(required_chain_id: ChainId, epoch: u64) -> Self {
        Self {
            state: SessionState::Connecting,
            ..Self::disconnected(required_chain_id, epoch)
        }
    }

    /// Account and chain resolved. The handle must be bound to `account` on
    /// `chain_id` and issued under `epoch`.
    pub fn resolved(
        account: Address,
        chain_id: ChainId,
        required_chain_id: ChainId,
        contract: DnaIdentityContract,
        epoch: u64,
    ) -> Self {
        Self {
            state: SessionState::resolved(chain_id == required_chain_id),
            account: Some(account),
            chain_id: Some(chain_id),
            required_chain_id,
            contract: Some(contract),
            epoch,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.has_account()
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.chain_id
    }

    pub fn required_chain_id(&self) -> ChainId {
        self.required_chain_id
    }

    /// Always derived from the current chain id.
    pub fn is_correct_network(&self) -> bool {
        self.chain_id == Some(self.required_chain_id)
    }

    pub fn contract(&self) -> Option<&DnaIdentityContract> {
        self.contract.as_ref()
    }

    /// Monotonic counter identifying the snapshot a handle was issued under.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Serializable view for API consumers.
    pub fn view(&self) -> SessionView {
        SessionView {
            state: self.state,
            connected: self.is_connected(),
            account: self.account,
            chain_id: self.chain_id,
            network_name: self.chain_id.map(|c| c.network_name()),
            required_chain_id: self.required_chain_id,
            is_correct_network: self.is_correct_network(),
            contract_address: self.contract.as_ref().map(|c| c.address()),
            epoch: self.epoch,
        }
    }
}

/// Wire form of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub state: SessionState,
    pub connected: bool,
    pub account: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub network_name: Option<String>,
    pub required_chain_id: ChainId,
    pub is_correct_network: bool,
    pub contract_address: Option<Address>,
    pub epoch: u64,
}

/// Holds the current snapshot and notifies subscribers on every replacement.
pub struct SessionStore {
    sender: watch::Sender<Session>,
    epoch: AtomicU64,
}

impl SessionStore {
    /// Create a store holding a disconnected session.
    pub fn new(required_chain_id: ChainId) -> Self {
        let (sender, _) = watch::channel(Session::disconnected(required_chain_id, 0));
        Self {
            sender,
            epoch: AtomicU64::new(0),
        }
    }

    /// Reserve the epoch for the next snapshot.
    pub fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn snapshot(&self) -> Session {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.sender.subscribe()
    }

    /// Replace the snapshot.
    pub fn replace(&self, session: Session) -> Result<()> {
        self.replace_if(|_| Some(session)).map(|_| ())
    }

    /// Replace the snapshot with whatever `f` returns for the current one.
    ///
    /// Decision and replacement happen under the channel lock. Returns
    /// whether a replacement was published.
    pub fn replace_if<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(&Session) -> Option<Session>,
    {
        let mut outcome = Ok(false);
        self.sender.send_if_modified(|current| match f(current) {
            Some(next) if current.state.can_transition_to(next.state) => {
                *current = next;
                outcome = Ok(true);
                true
            }
            Some(next) => {
                outcome = Err(DnaIdentityError::InvalidStateTransition {
                    from: current.state,
                    to: next.state,
                });
                false
            }
            None => false,
        });
        outcome
    }
}
