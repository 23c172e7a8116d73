//! Minting a DNA identity token.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{token_id_u64, MetadataDraft};
use crate::contract::hash_hex;
use crate::error::DnaIdentityError;
use crate::session::WalletSession;
use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MintRequest {
    pub dna_hash: String,
    #[serde(flatten)]
    pub draft: MetadataDraft,
}

/// Outcome of a mined mint transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintReceipt {
    pub tx_hash: String,
    /// `None` when the receipt carried no `Transfer` log from the ledger.
    pub token_id: Option<u64>,
    pub explorer_url: String,
}

/// Mint a token for the session account and wait until it is mined.
pub async fn mint(session: &WalletSession, request: &MintRequest) -> Result<MintReceipt> {
    let contract = session.contract()?;

    // Stored as given; only the blank check trims.
    let dna_hash = request.dna_hash.as_str();
    if dna_hash.trim().is_empty() {
        return Err(DnaIdentityError::InvalidInput("DNA hash is required".to_string()));
    }

    let token_uri = request.draft.to_token_uri(dna_hash)?;
    let tx = contract.mint_dna_identity(dna_hash, &token_uri).await?;
    let tx_hash = hash_hex(&tx);
    info!(%tx_hash, "mint transaction submitted");

    let receipt = contract.wait_for_receipt(tx).await?;
    let token_id = contract
        .minted_token_id(&receipt)
        .map(token_id_u64)
        .transpose()?;
    info!(%tx_hash, ?token_id, "DNA identity minted");

    Ok(MintReceipt {
        explorer_url: session.config().network.explorer_tx_url(&tx_hash),
        tx_hash,
        token_id,
    })
}
