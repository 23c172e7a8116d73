//! Token metadata carried in the token URI.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Image used when a token has none.
pub const PLACEHOLDER_IMAGE: &str = "https://images.pexels.com/photos/356040/pexels-photo-356040.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2";

pub const DEFAULT_DESCRIPTION: &str = "A DNA Identity NFT secured on the blockchain";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

impl Attribute {
    fn is_blank(&self) -> bool {
        self.trait_type.trim().is_empty() || self.value.trim().is_empty()
    }
}

/// Metadata stored on chain as the token URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dna_hash: Option<String>,
}

impl TokenMetadata {
    /// Metadata for a token whose URI is not inline JSON.
    pub fn fallback(token_id: u64) -> Self {
        Self {
            name: format!("DNA Identity #{}", token_id),
            description: "DNA Identity NFT".to_string(),
            image: PLACEHOLDER_IMAGE.to_string(),
            attributes: Vec::new(),
            dna_hash: None,
        }
    }

    /// Parse a token URI, falling back when it is not a JSON object.
    pub fn from_token_uri(token_id: u64, uri: &str) -> Self {
        serde_json::from_str(uri).unwrap_or_else(|_| Self::fallback(token_id))
    }
}

/// User input for a new token. Blank fields take defaults when rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl MetadataDraft {
    /// Render the final metadata. `minted_at_millis` names unnamed tokens.
    pub fn render(&self, dna_hash: &str, minted_at_millis: u128) -> TokenMetadata {
        fn or_default(value: &str, default: impl FnOnce() -> String) -> String {
            if value.trim().is_empty() {
                default()
            } else {
                value.to_string()
            }
        }

        TokenMetadata {
            name: or_default(&self.name, || format!("DNA Identity #{}", minted_at_millis)),
            description: or_default(&self.description, || DEFAULT_DESCRIPTION.to_string()),
            image: or_default(&self.image, || PLACEHOLDER_IMAGE.to_string()),
            attributes: self
                .attributes
                .iter()
                .filter(|a| !a.is_blank())
                .cloned()
                .collect(),
            dna_hash: Some(dna_hash.to_string()),
        }
    }

    /// Token URI JSON for minting now.
    pub fn to_token_uri(&self, dna_hash: &str) -> crate::Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Ok(serde_json::to_string(&self.render(dna_hash, now))?)
    }
}
