//! Provider push events.
//!
//! Wallets notify the application when the set of authorized accounts or the
//! active chain changes. The hub fans those notifications out to every
//! subscriber over a tokio broadcast channel.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::session::{Address, ChainId};

/// Events beyond this capacity cause slow subscribers to lag.
const DEFAULT_CAPACITY: usize = 64;

/// A notification pushed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProviderEvent {
    /// The authorized account set changed. Empty means the wallet revoked access.
    AccountsChanged { accounts: Vec<Address> },
    /// The wallet moved to another chain.
    ChainChanged { chain_id: ChainId },
}

/// Fan-out point for provider events.
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<ProviderEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Deliver an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        tracing::debug!(?event, "provider event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

/// A live event subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<ProviderEvent>,
}

impl Subscription {
    /// Wait for the next event. Returns `None` once the hub is gone.
    ///
    /// A lagging subscriber skips the events it missed; every event carries
    /// the full new value, so only the latest one matters.
    pub async fn recv(&mut self) -> Option<ProviderEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "provider event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Explicitly release the subscription.
    pub fn unsubscribe(self) {}
}
