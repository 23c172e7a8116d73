//! DNA identity consumers.
//!
//! Minting, browsing and verifying tokens on the ledger. None of these hold
//! session state: each call asks the [`WalletSession`](crate::session::WalletSession)
//! for a fresh contract handle and fails with `NotConnected` or
//! `WrongNetwork` when there is none to give.

mod gallery;
mod metadata;
mod mint;
mod verify;

pub use gallery::{owned_tokens, token_details, DnaToken};
pub use metadata::{Attribute, MetadataDraft, TokenMetadata, DEFAULT_DESCRIPTION, PLACEHOLDER_IMAGE};
pub use mint::{mint, MintReceipt, MintRequest};
pub use verify::{verify, VerificationReport, VerifyRequest};

use alloy_primitives::U256;

use crate::error::DnaIdentityError;
use crate::Result;

fn token_id_u64(id: U256) -> Result<u64> {
    u64::try_from(id)
        .map_err(|_| DnaIdentityError::ContractCall(format!("token id {} out of range", id)))
}
