//! Account address type: `0x` followed by 40 hex digits.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An account address, always stored in lowercase `0x`-prefixed form.
///
/// Every caller identity and every ledger / registry key is an `Address`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// The standard prefix for all addresses.
    pub const PREFIX: &'static str = "0x";

    /// Number of raw bytes behind the hex encoding.
    pub const BYTES: usize = 20;

    /// Parse and normalize an address.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let body = raw
            .strip_prefix(Self::PREFIX)
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| TypesError::InvalidAddress(raw.to_string()))?;
        let bytes = hex::decode(body).map_err(|_| TypesError::InvalidAddress(raw.to_string()))?;
        if bytes.len() != Self::BYTES {
            return Err(TypesError::InvalidAddress(raw.to_string()));
        }
        Ok(Self::from_bytes(&bytes_array(&bytes)))
    }

    /// Create an address from raw bytes.
    pub fn from_bytes(bytes: &[u8; 20]) -> Self {
        Self(format!("{}{}", Self::PREFIX, hex::encode(bytes)))
    }

    /// Create an address whose low 8 bytes are `seed` (big-endian), the rest zero.
    ///
    /// Handy for fixtures and demo scripts.
    pub fn from_low_u64(seed: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&seed.to_be_bytes());
        Self::from_bytes(&bytes)
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form used in log lines: `0x1234…abcd`.
    pub fn short(&self) -> String {
        let s = &self.0;
        format!("{}…{}", &s[..6], &s[s.len() - 4..])
    }
}

fn bytes_array(bytes: &[u8]) -> [u8; 20] {
    let mut out = [0u8; 20];
    out.copy_from_slice(bytes);
    out
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
