//! Tokens owned by the session account.

use alloy_primitives::U256;
use serde::Serialize;
use tracing::{debug, warn};

use super::{token_id_u64, TokenMetadata};
use crate::contract::DnaIdentityContract;
use crate::session::{Address, WalletSession};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnaToken {
    pub id: u64,
    pub owner: Address,
    pub dna_hash: String,
    pub token_uri: String,
    pub metadata: TokenMetadata,
}

async fn load(contract: &DnaIdentityContract, id: u64, owner: Address) -> Result<DnaToken> {
    let token_id = U256::from(id);
    let dna_hash = contract.get_dna_hash(token_id).await?;
    let token_uri = contract.token_uri(token_id).await?;
    let metadata = TokenMetadata::from_token_uri(id, &token_uri);

    Ok(DnaToken {
        id,
        owner,
        dna_hash,
        token_uri,
        metadata,
    })
}

/// List the session account's tokens.
///
/// The ledger has no owner index, so ids `1..tokenCounter` are scanned.
/// Tokens that fail to load are skipped.
pub async fn owned_tokens(session: &WalletSession) -> Result<Vec<DnaToken>> {
    let contract = session.contract()?;
    let account = contract.signer();

    if contract.balance_of(account).await?.is_zero() {
        return Ok(Vec::new());
    }

    let counter = token_id_u64(contract.token_counter().await?)?;
    debug!(%account, counter, "scanning ledger for owned tokens");

    let mut tokens = Vec::new();
    for id in 1..counter {
        let owner = match contract.owner_of(U256::from(id)).await {
            Ok(owner) => owner,
            Err(e) => {
                warn!(token_id = id, error = %e, "skipping token");
                continue;
            }
        };
        if owner != account {
            continue;
        }
        match load(&contract, id, owner).await {
            Ok(token) => tokens.push(token),
            Err(e) => warn!(token_id = id, error = %e, "skipping token"),
        }
    }

    Ok(tokens)
}

/// Owner, hash, token URI and metadata of one token.
pub async fn token_details(session: &WalletSession, id: u64) -> Result<DnaToken> {
    let contract = session.contract()?;
    let owner = contract.owner_of(U256::from(id)).await?;
    load(&contract, id, owner).await
}
