//! Chain identifiers and add-network metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DnaIdentityError;

/// Numeric identifier of a ledger network (EIP-155).
///
/// Displayed in decimal; wallets exchange it as a `0x`-prefixed hex quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(u64);

impl ChainId {
    pub const MAINNET: ChainId = ChainId(1);
    pub const SEPOLIA: ChainId = ChainId(11_155_111);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Hex quantity form used in wallet requests, e.g. `0xaa36a7`.
    pub fn to_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }

    /// Human-readable network name.
    pub fn network_name(&self) -> String {
        match self.0 {
            1 => "Ethereum Mainnet".to_string(),
            5 => "Goerli Testnet".to_string(),
            11_155_111 => "Sepolia Testnet".to_string(),
            137 => "Polygon Mainnet".to_string(),
            80_001 => "Mumbai Testnet".to_string(),
            other => format!("Chain ID: {}", other),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = DnaIdentityError;

    /// Accepts both hex quantities (`0xaa36a7`) and decimal strings (`11155111`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse(),
        };
        parsed
            .map(ChainId)
            .map_err(|_| DnaIdentityError::InvalidInput(format!("invalid chain id: {}", s)))
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(ChainId(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Native currency description for `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything a wallet needs to add an unknown chain (EIP-3085).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMetadata {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_url: String,
    pub block_explorer_url: String,
}

impl ChainMetadata {
    /// Metadata for the Sepolia test network.
    pub fn sepolia() -> Self {
        Self {
            chain_id: ChainId::SEPOLIA,
            chain_name: "Sepolia Testnet".to_string(),
            native_currency: NativeCurrency {
                name: "ETH".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            rpc_url: "https://rpc.sepolia.org".to_string(),
            block_explorer_url: "https://sepolia.etherscan.io".to_string(),
        }
    }

    /// Parameter object in the shape wallets expect.
    pub fn to_add_chain_params(&self) -> serde_json::Value {
        serde_json::json!({
            "chainId": self.chain_id.to_hex(),
            "chainName": self.chain_name,
            "nativeCurrency": self.native_currency,
            "rpcUrls": [self.rpc_url],
            "blockExplorerUrls": [self.block_explorer_url],
        })
    }

    /// Explorer link for a transaction hash.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.block_explorer_url.trim_end_matches('/'), tx_hash)
    }
}

impl Default for ChainMetadata {
    fn default() -> Self {
        Self::sepolia()
    }
}
