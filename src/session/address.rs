//! Account address type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DnaIdentityError;

/// A 20-byte chain address, always rendered lowercase.
///
/// Wallets hand out addresses in EIP-55 mixed case; comparisons and display
/// inside the session use the lowercase form so two spellings of the same
/// account never look like an account change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(alloy_primitives::Address);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address(alloy_primitives::Address::ZERO);

    /// Wrap a raw alloy address.
    pub fn from_alloy(inner: alloy_primitives::Address) -> Self {
        Self(inner)
    }

    /// Get the underlying alloy address.
    pub fn as_alloy(&self) -> alloy_primitives::Address {
        self.0
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Shortened form for compact display: `0x1234...abcd`.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_slice()))
    }
}

impl FromStr for Address {
    type Err = DnaIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| DnaIdentityError::InvalidAddress(s.into()))?;

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_part, &mut bytes)
            .map_err(|_| DnaIdentityError::InvalidAddress(s.into()))?;
        Ok(Self(alloy_primitives::Address::from(bytes)))
    }
}

impl From<alloy_primitives::Address> for Address {
    fn from(inner: alloy_primitives::Address) -> Self {
        Self(inner)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
