//! Wallet session state machine.

use serde::Serialize;

/// Represents the lifecycle state of the wallet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No account resolved.
    #[default]
    Disconnected,
    /// An authorization prompt is pending in the wallet.
    Connecting,
    /// Account resolved and the wallet is on the required chain.
    Connected,
    /// Account resolved but the wallet is on another chain.
    WrongNetwork,
}

impl SessionState {
    /// State of a resolved session given whether its chain matches.
    pub fn resolved(is_correct_network: bool) -> Self {
        if is_correct_network {
            SessionState::Connected
        } else {
            SessionState::WrongNetwork
        }
    }

    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Disconnected -> Connecting (user-initiated connect)
    /// - Disconnected -> Connected | WrongNetwork (already-authorized account on load)
    /// - Connecting -> Connected | WrongNetwork | Disconnected
    /// - Connected | WrongNetwork -> Connected | WrongNetwork (resync, chain change)
    /// - Connected | WrongNetwork -> Disconnected
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (*self, target),
            (Disconnected, Connecting)
                | (Disconnected, Connected)
                | (Disconnected, WrongNetwork)
                | (Disconnected, Disconnected)
                | (Connecting, Connected)
                | (Connecting, WrongNetwork)
                | (Connecting, Disconnected)
                | (Connected, Connected)
                | (Connected, WrongNetwork)
                | (Connected, Disconnected)
                | (WrongNetwork, Connected)
                | (WrongNetwork, WrongNetwork)
                | (WrongNetwork, Disconnected)
        )
    }

    /// Whether an account is resolved in this state.
    pub fn has_account(&self) -> bool {
        matches!(self, SessionState::Connected | SessionState::WrongNetwork)
    }

    /// Whether contract calls may be issued.
    pub fn can_transact(&self) -> bool {
        matches!(self, SessionState::Connected)
    }
}
