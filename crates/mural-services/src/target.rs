//! Which token on which drawing contract a queue writes to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The drawing a queue writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Drawing contract address.
    #[serde(with = "hex_serde")]
    pub contract: [u8; 20],
    /// Token whose drawing is written.
    pub token_id: u64,
}

impl Target {
    pub fn new(contract: [u8; 20], token_id: u64) -> Self {
        Self { contract, token_id }
    }

    /// Build a target from a hex contract address (`0x` prefix optional).
    pub fn parse(contract: &str, token_id: u64) -> Result<Self, TargetError> {
        Ok(Self {
            contract: parse_address(contract)?,
            token_id,
        })
    }

    pub fn contract_hex(&self) -> String {
        format!("0x{}", hex::encode(self.contract))
    }

    /// File-name-safe key, unique per target.
    pub fn storage_key(&self) -> String {
        format!("{}-{}", hex::encode(self.contract), self.token_id)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.contract_hex(), self.token_id)
    }
}

/// Parses the `Display` form, `0x<address>#<token>`.
impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (contract, token) = s
            .split_once('#')
            .ok_or_else(|| TargetError::Malformed(s.to_string()))?;
        let token_id = token
            .parse()
            .map_err(|_| TargetError::Malformed(s.to_string()))?;
        Self::parse(contract, token_id)
    }
}

fn parse_address(s: &str) -> Result<[u8; 20], TargetError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| TargetError::InvalidHex(e.to_string()))?;
    if bytes.len() != 20 {
        return Err(TargetError::AddressLength(bytes.len()));
    }
    let mut arr = [0u8; 20];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid contract hex: {0}")]
    InvalidHex(String),
    #[error("contract address must be 20 bytes, got {0}")]
    AddressLength(usize),
    #[error("malformed target {0:?}, expected 0x<address>#<token>")]
    Malformed(String),
}

mod hex_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 20], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 20], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_address(&s).map_err(serde::de::Error::custom)
    }
}
