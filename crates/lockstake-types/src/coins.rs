//! Token amounts in the smallest currency unit (nanotons).
//!
//! On the wire an amount is a 4-bit byte length followed by that many bytes
//! of big-endian magnitude, so the largest representable amount is
//! `2^120 - 1`. [`Coins`] enforces that bound at construction, which keeps
//! the encoder total.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{EscrowError, Result, constants};

/// A non-negative token amount that always fits the wire encoding.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(try_from = "u128", into = "u128")]
pub struct Coins(u128);

impl Coins {
    /// Zero nanotons.
    pub const ZERO: Self = Self(0);

    /// Largest encodable amount: `2^120 - 1`.
    pub const MAX: Self = Self((1u128 << 120) - 1);

    /// Checked constructor.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if `nanos` exceeds [`Coins::MAX`].
    pub fn new(nanos: u128) -> Result<Self> {
        if nanos > Self::MAX.0 {
            return Err(EscrowError::invalid_argument(format!(
                "amount {nanos} exceeds the coins maximum {}",
                Self::MAX.0
            )));
        }
        Ok(Self(nanos))
    }

    /// Any `u64` amount is always in range.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos as u128)
    }

    #[must_use]
    pub const fn nanos(self) -> u128 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).and_then(|v| Self::new(v).ok())
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// `self * percent / 100`, truncating toward zero.
    ///
    /// Returns `None` only when the result would not be encodable.
    #[must_use]
    pub fn checked_percent(self, percent: u8) -> Option<Self> {
        let scaled = self.0.checked_mul(u128::from(percent))?;
        Self::new(scaled / constants::PERCENT_DENOMINATOR).ok()
    }

    /// Minimal number of magnitude bytes needed on the wire.
    #[must_use]
    pub fn byte_len(self) -> u32 {
        (128 - self.0.leading_zeros()).div_ceil(8)
    }

    /// Amount in whole TON (nanotons scaled by 10^-9).
    ///
    /// `None` when the magnitude is too large for a 96-bit decimal mantissa.
    #[must_use]
    pub fn to_ton(self) -> Option<Decimal> {
        let mantissa = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(mantissa, constants::TON_DECIMALS).ok()
    }
}

impl TryFrom<u128> for Coins {
    type Error = EscrowError;

    fn try_from(nanos: u128) -> Result<Self> {
        Self::new(nanos)
    }
}

impl From<Coins> for u128 {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_enforced() {
        assert!(Coins::new(Coins::MAX.nanos()).is_ok());
        let err = Coins::new(Coins::MAX.nanos() + 1).unwrap_err();
        assert!(matches!(err, EscrowError::InvalidArgument { .. }));
        assert!(Coins::MAX.checked_add(Coins::from_nanos(1)).is_none());
    }

    #[test]
    fn byte_len_is_minimal() {
        assert_eq!(Coins::ZERO.byte_len(), 0);
        assert_eq!(Coins::from_nanos(1).byte_len(), 1);
        assert_eq!(Coins::from_nanos(255).byte_len(), 1);
        assert_eq!(Coins::from_nanos(256).byte_len(), 2);
        assert_eq!(Coins::from_nanos(u64::MAX).byte_len(), 8);
        assert_eq!(Coins::MAX.byte_len(), 15);
    }

    #[test]
    fn percent_truncates() {
        assert_eq!(Coins::from_nanos(10).checked_percent(5), Some(Coins::ZERO));
        assert_eq!(
            Coins::from_nanos(1_000).checked_percent(5),
            Some(Coins::from_nanos(50))
        );
        assert_eq!(
            Coins::from_nanos(199).checked_percent(10),
            Some(Coins::from_nanos(19))
        );
        assert_eq!(Coins::MAX.checked_percent(100), Some(Coins::MAX));
        assert!(Coins::MAX.checked_percent(200).is_none());
    }

    #[test]
    fn ton_conversion() {
        let one_and_half = Coins::from_nanos(1_500_000_000);
        assert_eq!(one_and_half.to_ton(), Some(Decimal::new(15, 1)));
        assert!(Coins::MAX.to_ton().is_none());
    }

    #[test]
    fn serde_rejects_out_of_range() {
        let json = serde_json::to_string(&Coins::from_nanos(42)).unwrap();
        assert_eq!(json, "42");
        let back: Coins = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Coins::from_nanos(42));

        let too_big = format!("{}", u128::MAX);
        assert!(serde_json::from_str::<Coins>(&too_big).is_err());
    }
}
