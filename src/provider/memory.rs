//! In-process wallet with a simulated DNA identity ledger.
//!
//! Used by the `memory` wallet backend and by tests. Besides answering the
//! EIP-1193 methods it can be scripted: queue failures for a method, hold a
//! prompt open until released, revoke access or move chains out of band.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use alloy_primitives::{keccak256, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Notify;

use super::{
    EventHub, Log, ProviderEvent, ProviderRpcError, Subscription, TransactionReceipt,
    TransactionRequest, WalletProvider, EXECUTION_REVERTED, INVALID_PARAMS, UNAUTHORIZED,
    UNSUPPORTED_METHOD,
};
use crate::contract::IDnaIdentity;
use crate::session::{Address, ChainId};

/// Account used by the demo wallet.
pub const DEMO_ACCOUNT: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

/// Handle that keeps one pending wallet prompt open until released.
#[derive(Debug, Clone)]
pub struct PromptGate {
    notify: Arc<Notify>,
}

impl PromptGate {
    /// Let the held request proceed.
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

#[derive(Debug, Clone)]
struct TokenRecord {
    owner: Address,
    dna_hash: String,
    uri: String,
}

#[derive(Debug)]
struct Ledger {
    contract: Address,
    tokens: BTreeMap<u64, TokenRecord>,
    next_id: u64,
    nonce: u64,
    receipt_delay: u32,
    receipts: HashMap<B256, (u32, TransactionReceipt)>,
}

fn revert(reason: &str) -> ProviderRpcError {
    ProviderRpcError::new(EXECUTION_REVERTED, format!("execution reverted: {}", reason))
}

fn decode_call<C: SolCall>(data: &[u8]) -> Result<C, ProviderRpcError> {
    C::abi_decode(data, true).map_err(|e| ProviderRpcError::new(INVALID_PARAMS, e.to_string()))
}

fn token_id(id: U256) -> Result<u64, ProviderRpcError> {
    u64::try_from(id).map_err(|_| revert("ERC721: invalid token ID"))
}

fn address_topic(address: &Address) -> B256 {
    let mut topic = [0u8; 32];
    topic[12..].copy_from_slice(address.as_bytes());
    B256::from(topic)
}

impl Ledger {
    fn new(contract: Address) -> Self {
        Self {
            contract,
            tokens: BTreeMap::new(),
            next_id: 1,
            nonce: 0,
            receipt_delay: 0,
            receipts: HashMap::new(),
        }
    }

    fn token(&self, id: U256) -> Result<&TokenRecord, ProviderRpcError> {
        self.tokens
            .get(&token_id(id)?)
            .ok_or_else(|| revert("ERC721: invalid token ID"))
    }

    fn mint(&mut self, owner: Address, dna_hash: String, uri: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.tokens.insert(
            id,
            TokenRecord {
                owner,
                dna_hash,
                uri,
            },
        );
        id
    }

    fn call(&self, tx: &TransactionRequest) -> Result<Bytes, ProviderRpcError> {
        if tx.to != self.contract {
            return Ok(Bytes::new());
        }

        let data = tx.data.as_ref();
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| revert("missing selector"))?;

        let output = match selector {
            IDnaIdentity::balanceOfCall::SELECTOR => {
                let call: IDnaIdentity::balanceOfCall = decode_call(data)?;
                let owner = Address::from(call.owner);
                let count = self.tokens.values().filter(|t| t.owner == owner).count();
                IDnaIdentity::balanceOfCall::abi_encode_returns(&(U256::from(count),))
            }
            IDnaIdentity::ownerOfCall::SELECTOR => {
                let call: IDnaIdentity::ownerOfCall = decode_call(data)?;
                let token = self.token(call.tokenId)?;
                IDnaIdentity::ownerOfCall::abi_encode_returns(&(token.owner.as_alloy(),))
            }
            IDnaIdentity::tokenCounterCall::SELECTOR => {
                IDnaIdentity::tokenCounterCall::abi_encode_returns(&(U256::from(self.next_id),))
            }
            IDnaIdentity::tokenURICall::SELECTOR => {
                let call: IDnaIdentity::tokenURICall = decode_call(data)?;
                let token = self.token(call.tokenId)?;
                IDnaIdentity::tokenURICall::abi_encode_returns(&(token.uri.clone(),))
            }
            IDnaIdentity::getDNAHashCall::SELECTOR => {
                let call: IDnaIdentity::getDNAHashCall = decode_call(data)?;
                let token = self.token(call.tokenId)?;
                IDnaIdentity::getDNAHashCall::abi_encode_returns(&(token.dna_hash.clone(),))
            }
            IDnaIdentity::verifyDNACall::SELECTOR => {
                let call: IDnaIdentity::verifyDNACall = decode_call(data)?;
                let token = self.token(call.tokenId)?;
                IDnaIdentity::verifyDNACall::abi_encode_returns(&(token.dna_hash == call.dnaHash,))
            }
            _ => return Err(revert("unknown function selector")),
        };

        Ok(Bytes::from(output))
    }

    fn transact(&mut self, tx: &TransactionRequest) -> Result<B256, ProviderRpcError> {
        if tx.to != self.contract {
            return Err(revert("transaction target is not the ledger contract"));
        }

        let call: IDnaIdentity::mintDNAIdentityCall = decode_call(tx.data.as_ref())?;
        if call.dnaHash.is_empty() {
            return Err(revert("DNA hash required"));
        }
        let id = self.mint(tx.from, call.dnaHash, call.metadata);

        self.nonce += 1;
        let mut preimage = tx.from.as_bytes().to_vec();
        preimage.extend_from_slice(&self.nonce.to_be_bytes());
        let tx_hash = keccak256(&preimage);

        let receipt = TransactionReceipt {
            transaction_hash: tx_hash,
            status: Some("0x1".to_string()),
            logs: vec![Log {
                address: self.contract,
                topics: vec![
                    IDnaIdentity::Transfer::SIGNATURE_HASH,
                    B256::ZERO,
                    address_topic(&tx.from),
                    B256::from(U256::from(id).to_be_bytes::<32>()),
                ],
                data: Bytes::new(),
            }],
        };
        self.receipts
            .insert(tx_hash, (self.receipt_delay, receipt));
        Ok(tx_hash)
    }

    fn receipt(&mut self, tx_hash: &B256) -> Option<TransactionReceipt> {
        let (remaining, receipt) = self.receipts.get_mut(tx_hash)?;
        if *remaining > 0 {
            *remaining -= 1;
            None
        } else {
            Some(receipt.clone())
        }
    }
}

#[derive(Debug)]
struct WalletState {
    accounts: Vec<Address>,
    authorized: bool,
    chain_id: ChainId,
    known_chains: Vec<ChainId>,
    failures: HashMap<String, VecDeque<ProviderRpcError>>,
    gates: HashMap<String, Arc<Notify>>,
    calls: HashMap<String, usize>,
    ledger: Ledger,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainParam {
    chain_id: ChainId,
}

fn first_param<T: for<'de> Deserialize<'de>>(params: &Value) -> Result<T, ProviderRpcError> {
    params
        .get(0)
        .cloned()
        .ok_or_else(|| ProviderRpcError::new(INVALID_PARAMS, "missing parameter"))
        .and_then(|v| {
            serde_json::from_value(v).map_err(|e| ProviderRpcError::new(INVALID_PARAMS, e.to_string()))
        })
}

/// An in-memory EIP-1193 wallet.
pub struct MemoryWallet {
    state: Mutex<WalletState>,
    events: EventHub,
}

impl MemoryWallet {
    /// Create a wallet with no accounts on `chain_id`, serving the ledger at `contract`.
    pub fn new(contract: Address, chain_id: ChainId) -> Self {
        Self {
            state: Mutex::new(WalletState {
                accounts: Vec::new(),
                authorized: false,
                chain_id,
                known_chains: vec![chain_id],
                failures: HashMap::new(),
                gates: HashMap::new(),
                calls: HashMap::new(),
                ledger: Ledger::new(contract),
            }),
            events: EventHub::new(),
        }
    }

    /// Wallet with one demo account that also knows Ethereum mainnet.
    pub fn demo(contract: Address, chain_id: ChainId) -> crate::Result<Self> {
        let wallet = Self::new(contract, chain_id);
        wallet.add_account(DEMO_ACCOUNT.parse()?);
        wallet.add_known_chain(ChainId::MAINNET);
        Ok(wallet)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut WalletState) -> R) -> R {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }

    /// Hub that delivers this wallet's events.
    pub fn events(&self) -> EventHub {
        self.events.clone()
    }

    pub fn add_account(&self, account: Address) {
        self.with_state(|s| s.accounts.push(account));
    }

    /// Authorize the application without a prompt, as if done in a previous visit.
    pub fn authorize(&self) {
        self.with_state(|s| s.authorized = true);
    }

    /// Revoke the application's access from the wallet side.
    pub fn revoke(&self) {
        self.with_state(|s| s.authorized = false);
        self.events
            .emit(ProviderEvent::AccountsChanged { accounts: vec![] });
    }

    /// Replace the wallet's accounts from the wallet side (e.g. the user picked another one).
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        let visible = self.with_state(|s| {
            s.accounts = accounts.clone();
            s.authorized
        });
        if visible {
            self.events.emit(ProviderEvent::AccountsChanged { accounts });
        }
    }

    pub fn add_known_chain(&self, chain_id: ChainId) {
        self.with_state(|s| {
            if !s.known_chains.contains(&chain_id) {
                s.known_chains.push(chain_id);
            }
        });
    }

    /// Move the wallet to another chain from the wallet side.
    pub fn change_chain(&self, chain_id: ChainId) {
        self.with_state(|s| {
            s.chain_id = chain_id;
            if !s.known_chains.contains(&chain_id) {
                s.known_chains.push(chain_id);
            }
        });
        self.events.emit(ProviderEvent::ChainChanged { chain_id });
    }

    pub fn chain_id(&self) -> ChainId {
        self.with_state(|s| s.chain_id)
    }

    pub fn is_authorized(&self) -> bool {
        self.with_state(|s| s.authorized)
    }

    /// Make the next request for `method` fail with `err`. Calls queue up.
    pub fn fail_next(&self, method: &str, err: ProviderRpcError) {
        self.with_state(|s| {
            s.failures
                .entry(method.to_string())
                .or_default()
                .push_back(err)
        });
    }

    /// Hold the next request for `method` pending until the gate is released.
    pub fn hold(&self, method: &str) -> PromptGate {
        let notify = Arc::new(Notify::new());
        self.with_state(|s| s.gates.insert(method.to_string(), Arc::clone(&notify)));
        PromptGate { notify }
    }

    /// Number of requests received for `method`.
    pub fn request_count(&self, method: &str) -> usize {
        self.with_state(|s| s.calls.get(method).copied().unwrap_or(0))
    }

    /// Number of receipt polls that return `null` before a new transaction is mined.
    pub fn set_receipt_delay(&self, polls: u32) {
        self.with_state(|s| s.ledger.receipt_delay = polls);
    }

    /// Put a token on the ledger directly, bypassing the wallet.
    pub fn seed_token(&self, owner: Address, dna_hash: &str, uri: &str) -> u64 {
        self.with_state(|s| s.ledger.mint(owner, dna_hash.to_string(), uri.to_string()))
    }

    fn handle(&self, method: &str, params: &Value) -> Result<Value, ProviderRpcError> {
        let mut events = Vec::new();

        let result = self.with_state(|s| {
            if let Some(err) = s.failures.get_mut(method).and_then(|q| q.pop_front()) {
                return Err(err);
            }

            match method {
                "eth_accounts" => {
                    let accounts = if s.authorized {
                        s.accounts.clone()
                    } else {
                        Vec::new()
                    };
                    Ok(json!(accounts))
                }
                "eth_requestAccounts" => {
                    if s.accounts.is_empty() {
                        return Err(ProviderRpcError::new(UNAUTHORIZED, "wallet has no accounts"));
                    }
                    if !s.authorized {
                        s.authorized = true;
                        events.push(ProviderEvent::AccountsChanged {
                            accounts: s.accounts.clone(),
                        });
                    }
                    Ok(json!(s.accounts))
                }
                "eth_chainId" => Ok(json!(s.chain_id.to_hex())),
                "wallet_switchEthereumChain" => {
                    let param: ChainParam = first_param(params)?;
                    if !s.known_chains.contains(&param.chain_id) {
                        return Err(ProviderRpcError::unrecognized_chain(param.chain_id));
                    }
                    if s.chain_id != param.chain_id {
                        s.chain_id = param.chain_id;
                        events.push(ProviderEvent::ChainChanged {
                            chain_id: param.chain_id,
                        });
                    }
                    Ok(Value::Null)
                }
                "wallet_addEthereumChain" => {
                    let param: ChainParam = first_param(params)?;
                    if !s.known_chains.contains(&param.chain_id) {
                        s.known_chains.push(param.chain_id);
                    }
                    Ok(Value::Null)
                }
                "eth_call" => {
                    let tx: TransactionRequest = first_param(params)?;
                    Ok(json!(s.ledger.call(&tx)?))
                }
                "eth_sendTransaction" => {
                    let tx: TransactionRequest = first_param(params)?;
                    if !s.authorized || !s.accounts.contains(&tx.from) {
                        return Err(ProviderRpcError::new(
                            UNAUTHORIZED,
                            "sender is not an authorized account",
                        ));
                    }
                    Ok(json!(s.ledger.transact(&tx)?))
                }
                "eth_getTransactionReceipt" => {
                    let tx_hash: B256 = first_param(params)?;
                    Ok(json!(s.ledger.receipt(&tx_hash)))
                }
                other => Err(ProviderRpcError::new(
                    UNSUPPORTED_METHOD,
                    format!("unsupported method: {}", other),
                )),
            }
        });

        for event in events {
            self.events.emit(event);
        }
        result
    }
}

impl WalletProvider for MemoryWallet {
    fn request<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, Result<Value, ProviderRpcError>> {
        async move {
            let gate = self.with_state(|s| {
                *s.calls.entry(method.to_string()).or_insert(0) += 1;
                s.gates.remove(method)
            });
            if let Some(gate) = gate {
                gate.notified().await;
            }
            self.handle(method, &params)
        }
        .boxed()
    }

    fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }
}
