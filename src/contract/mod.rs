//! Contract handle for the DNA identity ledger.
//!
//! A handle is bound to one signer account on one chain and remembers the
//! session epoch it was issued under. Consumers must not keep a handle
//! across a session change; they ask the session for a fresh one per
//! operation.

pub mod abi;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{B256, U256};
use alloy_sol_types::{SolCall, SolEvent};

use crate::error::DnaIdentityError;
use crate::provider::{ProviderRpcError, TransactionReceipt, TransactionRequest, WalletProvider};
use crate::session::{Address, ChainId};
use crate::Result;

pub use abi::IDnaIdentity;

/// How often a pending transaction is polled for its receipt.
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Lowercase `0x`-prefixed hex form of a 32-byte hash.
pub fn hash_hex(hash: &B256) -> String {
    format!("0x{}", hex::encode(hash.as_slice()))
}

fn contract_error(err: ProviderRpcError) -> DnaIdentityError {
    if err.is_user_rejection() {
        DnaIdentityError::UserRejected(err.message)
    } else {
        DnaIdentityError::ContractCall(err.message)
    }
}

/// Bound interface to the DNA identity contract.
#[derive(Clone)]
pub struct DnaIdentityContract {
    address: Address,
    signer: Address,
    chain_id: ChainId,
    epoch: u64,
    poll_interval: Duration,
    provider: Arc<dyn WalletProvider>,
}

impl fmt::Debug for DnaIdentityContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnaIdentityContract")
            .field("address", &self.address)
            .field("signer", &self.signer)
            .field("chain_id", &self.chain_id)
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl DnaIdentityContract {
    pub fn new(
        address: Address,
        signer: Address,
        chain_id: ChainId,
        epoch: u64,
        provider: Arc<dyn WalletProvider>,
    ) -> Self {
        Self {
            address,
            signer,
            chain_id,
            epoch,
            poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            provider,
        }
    }

    /// Override the receipt polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Account the handle signs and reads as.
    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Session epoch this handle was issued under.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    async fn read<C: SolCall + Send>(&self, call: C) -> Result<C::Return> {
        let tx = TransactionRequest::new(self.signer, self.address, call.abi_encode());
        let output = self.provider.call(&tx).await.map_err(contract_error)?;

        C::abi_decode_returns(&output, true).map_err(|e| {
            DnaIdentityError::ContractCall(format!("failed to decode {}: {}", C::SIGNATURE, e))
        })
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        let ret = self
            .read(IDnaIdentity::balanceOfCall {
                owner: owner.as_alloy(),
            })
            .await?;
        Ok(ret.balance)
    }

    pub async fn owner_of(&self, token_id: U256) -> Result<Address> {
        let ret = self
            .read(IDnaIdentity::ownerOfCall { tokenId: token_id })
            .await?;
        Ok(Address::from(ret.owner))
    }

    /// Next token id to be minted; ids start at 1.
    pub async fn token_counter(&self) -> Result<U256> {
        let ret = self.read(IDnaIdentity::tokenCounterCall {}).await?;
        Ok(ret.counter)
    }

    pub async fn token_uri(&self, token_id: U256) -> Result<String> {
        let ret = self
            .read(IDnaIdentity::tokenURICall { tokenId: token_id })
            .await?;
        Ok(ret.uri)
    }

    pub async fn get_dna_hash(&self, token_id: U256) -> Result<String> {
        let ret = self
            .read(IDnaIdentity::getDNAHashCall { tokenId: token_id })
            .await?;
        Ok(ret.dnaHash)
    }

    pub async fn verify_dna(&self, token_id: U256, dna_hash: &str) -> Result<bool> {
        let ret = self
            .read(IDnaIdentity::verifyDNACall {
                tokenId: token_id,
                dnaHash: dna_hash.to_string(),
            })
            .await?;
        Ok(ret.valid)
    }

    /// Submit a mint transaction. Returns the transaction hash once the
    /// wallet has signed and broadcast it.
    pub async fn mint_dna_identity(&self, dna_hash: &str, metadata: &str) -> Result<B256> {
        let call = IDnaIdentity::mintDNAIdentityCall {
            dnaHash: dna_hash.to_string(),
            metadata: metadata.to_string(),
        };
        let tx = TransactionRequest::new(self.signer, self.address, call.abi_encode());
        self.provider
            .send_transaction(&tx)
            .await
            .map_err(contract_error)
    }

    /// Wait until the transaction is mined. There is no timeout.
    pub async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransactionReceipt> {
        loop {
            let receipt = self
                .provider
                .transaction_receipt(tx_hash)
                .await
                .map_err(contract_error)?;

            match receipt {
                Some(receipt) if receipt.succeeded() => return Ok(receipt),
                Some(_) => {
                    return Err(DnaIdentityError::ContractCall(format!(
                        "transaction {} reverted",
                        hash_hex(&tx_hash)
                    )))
                }
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    /// Token id from the `Transfer` log this contract emitted, if any.
    pub fn minted_token_id(&self, receipt: &TransactionReceipt) -> Option<U256> {
        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.address)
            .find(|log| {
                log.topics.len() == 4
                    && log.topics[0] == IDnaIdentity::Transfer::SIGNATURE_HASH
            })
            .map(|log| U256::from_be_bytes(log.topics[3].0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Log, MemoryWallet};

    const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
    const ACCOUNT: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    fn handle(wallet: &Arc<MemoryWallet>) -> DnaIdentityContract {
        let provider: Arc<dyn WalletProvider> = wallet.clone();
        DnaIdentityContract::new(
            CONTRACT.parse().unwrap(),
            ACCOUNT.parse().unwrap(),
            ChainId::SEPOLIA,
            1,
            provider,
        )
        .with_poll_interval(Duration::from_millis(5))
    }

    fn wallet() -> Arc<MemoryWallet> {
        let wallet = MemoryWallet::new(CONTRACT.parse().unwrap(), ChainId::SEPOLIA);
        wallet.add_account(ACCOUNT.parse().unwrap());
        wallet.authorize();
        Arc::new(wallet)
    }

    #[tokio::test]
    async fn test_mint_and_read_back() {
        let wallet = wallet();
        let contract = handle(&wallet);

        let tx = contract.mint_dna_identity("abc123", "{}").await.unwrap();
        let receipt = contract.wait_for_receipt(tx).await.unwrap();
        let token_id = contract.minted_token_id(&receipt).unwrap();
        assert_eq!(token_id, U256::from(1));

        assert_eq!(contract.owner_of(token_id).await.unwrap(), contract.signer());
        assert_eq!(contract.get_dna_hash(token_id).await.unwrap(), "abc123");
        assert_eq!(contract.token_uri(token_id).await.unwrap(), "{}");
        assert_eq!(contract.token_counter().await.unwrap(), U256::from(2));
        assert_eq!(
            contract.balance_of(contract.signer()).await.unwrap(),
            U256::from(1)
        );
    }

    #[tokio::test]
    async fn test_verify_dna() {
        let wallet = wallet();
        let contract = handle(&wallet);
        let tx = contract.mint_dna_identity("abc123", "{}").await.unwrap();
        contract.wait_for_receipt(tx).await.unwrap();

        assert!(contract.verify_dna(U256::from(1), "abc123").await.unwrap());
        assert!(!contract.verify_dna(U256::from(1), "zzz").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_token_is_contract_error() {
        let wallet = wallet();
        let contract = handle(&wallet);

        let err = contract.owner_of(U256::from(42)).await.unwrap_err();
        assert!(matches!(err, DnaIdentityError::ContractCall(_)));
    }

    #[tokio::test]
    async fn test_rejected_transaction() {
        let wallet = wallet();
        wallet.fail_next(
            "eth_sendTransaction",
            ProviderRpcError::user_rejected("User denied transaction signature."),
        );
        let contract = handle(&wallet);

        let err = contract.mint_dna_identity("abc", "{}").await.unwrap_err();
        assert!(matches!(err, DnaIdentityError::UserRejected(_)));
    }

    #[test]
    fn test_minted_token_id_ignores_foreign_logs() {
        let wallet = wallet();
        let contract = handle(&wallet);

        let mut topic_id = [0u8; 32];
        topic_id[31] = 9;
        let transfer = Log {
            address: Address::ZERO,
            topics: vec![
                IDnaIdentity::Transfer::SIGNATURE_HASH,
                B256::ZERO,
                B256::ZERO,
                B256::from(topic_id),
            ],
            data: Default::default(),
        };
        let mut receipt = TransactionReceipt {
            transaction_hash: B256::ZERO,
            status: Some("0x1".to_string()),
            logs: vec![transfer.clone()],
        };
        assert_eq!(contract.minted_token_id(&receipt), None);

        receipt.logs[0].address = contract.address();
        assert_eq!(contract.minted_token_id(&receipt), Some(U256::from(9)));
    }

    #[test]
    fn test_hash_hex() {
        assert_eq!(hash_hex(&B256::ZERO), format!("0x{}", "0".repeat(64)));
    }
}
