//! Account identifiers.
//!
//! An [`Address`] is the ledger's two-part account identifier: a signed
//! workchain id plus a 256-bit account hash. The textual "raw" form is
//! `<workchain>:<64 hex chars>`, e.g. `0:83df…` or `-1:3333…`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{EscrowError, Result};

/// Workchain id of the basechain, where user wallets live.
pub const BASECHAIN: i32 = 0;

/// Workchain id of the masterchain.
pub const MASTERCHAIN: i32 = -1;

/// Participant / administrator account identifier.
///
/// Ordering is `(workchain, hash)`, which makes iteration over any ordered
/// collection keyed by `Address` deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Address {
    /// Chain segment the account lives in.
    pub workchain: i32,
    /// 256-bit account hash.
    pub hash: [u8; 32],
}

impl Address {
    #[must_use]
    pub const fn new(workchain: i32, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Address on the basechain (workchain 0).
    #[must_use]
    pub const fn basechain(hash: [u8; 32]) -> Self {
        Self::new(BASECHAIN, hash)
    }

    /// Whether the workchain fits the compact 8-bit wire form.
    #[must_use]
    pub fn is_std(&self) -> bool {
        i8::try_from(self.workchain).is_ok()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// First four hash bytes in hex, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(&self.hash[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, hex::encode(self.hash))
    }
}

impl FromStr for Address {
    type Err = EscrowError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason: &str| EscrowError::InvalidAddress {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (wc, hash_hex) = input
            .trim()
            .split_once(':')
            .ok_or_else(|| invalid("expected `<workchain>:<hex hash>`"))?;
        let workchain: i32 = wc
            .parse()
            .map_err(|_| invalid("workchain is not a 32-bit integer"))?;
        if hash_hex.len() != 64 {
            return Err(invalid("hash must be exactly 64 hex characters"));
        }
        let mut hash = [0u8; 32];
        hex::decode_to_slice(hash_hex, &mut hash).map_err(|_| invalid("hash is not valid hex"))?;
        Ok(Self { workchain, hash })
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Random basechain address for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    pub fn random() -> Self {
        Self::basechain(rand::random::<[u8; 32]>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_form_roundtrip() {
        let addr = Address::new(MASTERCHAIN, [0x33; 32]);
        let text = addr.to_string();
        assert!(text.starts_with("-1:3333"));
        assert_eq!(text.len(), 3 + 64);
        let back: Address = text.parse().unwrap();
        assert_eq!(addr, back);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Address>().is_err());
        assert!("0".parse::<Address>().is_err());
        assert!("x:00".parse::<Address>().is_err());
        assert!("0:abcd".parse::<Address>().is_err());
        let bad_hex = format!("0:{}", "zz".repeat(32));
        let err = bad_hex.parse::<Address>().unwrap_err();
        assert!(matches!(err, EscrowError::InvalidAddress { .. }));
    }

    #[test]
    fn std_form_depends_on_workchain() {
        assert!(Address::basechain([0; 32]).is_std());
        assert!(Address::new(MASTERCHAIN, [0; 32]).is_std());
        assert!(!Address::new(1_000, [0; 32]).is_std());
    }

    #[test]
    fn ordering_is_workchain_then_hash() {
        let a = Address::new(-1, [9; 32]);
        let b = Address::new(0, [1; 32]);
        let c = Address::new(0, [2; 32]);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn serde_uses_raw_form() {
        let addr = Address::random();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
