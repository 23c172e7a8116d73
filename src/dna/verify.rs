//! Checking a DNA hash against a token.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::DnaIdentityError;
use crate::session::{Address, WalletSession};
use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Absent and `0` differ: `0` is passed through and left to the ledger.
    #[serde(default)]
    pub token_id: Option<u64>,
    #[serde(default)]
    pub dna_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub token_id: u64,
    pub owner: Address,
    pub stored_hash: String,
    pub matches: bool,
}

/// Compare `request.dna_hash` with the hash stored for the token.
pub async fn verify(session: &WalletSession, request: &VerifyRequest) -> Result<VerificationReport> {
    let contract = session.contract()?;

    let id = match request.token_id {
        Some(id) if !request.dna_hash.trim().is_empty() => id,
        _ => {
            return Err(DnaIdentityError::InvalidInput(
                "both token id and DNA hash are required".to_string(),
            ))
        }
    };

    let token_id = U256::from(id);
    let owner = contract.owner_of(token_id).await?;
    let stored_hash = contract.get_dna_hash(token_id).await?;
    let matches = contract.verify_dna(token_id, &request.dna_hash).await?;

    Ok(VerificationReport {
        token_id: id,
        owner,
        stored_hash,
        matches,
    })
}
