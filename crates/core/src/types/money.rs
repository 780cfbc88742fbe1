//! Currency amounts in minor units.
//!
//! Amounts are carried as integer minor units (cents for EUR) exactly as the
//! storefront client submits them. Display goes through `rust_decimal` so a
//! value never picks up binary floating point noise on its way to a receipt.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A currency amount in minor units (e.g. cents).
///
/// The currency itself is a shop-wide setting; see the server configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Create an amount from minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Get the amount in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply a unit price by a quantity, returning `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, qty: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(qty)).map(Self)
    }

    /// Add two amounts, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtract `other`, clamping the result at zero.
    #[must_use]
    pub fn minus_floor_zero(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).max(0))
    }

    /// The amount in major units as a decimal (`1990` -> `19.90`).
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Self(minor)
    }
}

impl From<Money> for i64 {
    fn from(money: Money) -> Self {
        money.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Money::from_minor(1990).to_string(), "19.90");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_minus_floor_zero_clamps() {
        let total = Money::from_minor(5);
        assert_eq!(total.minus_floor_zero(Money::from_minor(10)), Money::ZERO);
        assert_eq!(
            Money::from_minor(2000).minus_floor_zero(Money::from_minor(10)),
            Money::from_minor(1990)
        );
    }

    #[test]
    fn test_checked_mul_overflow() {
        assert_eq!(
            Money::from_minor(1000).checked_mul(2),
            Some(Money::from_minor(2000))
        );
        assert_eq!(Money::from_minor(i64::MAX).checked_mul(2), None);
    }

    #[test]
    fn test_sign_helpers() {
        assert!(Money::from_minor(1).is_positive());
        assert!(!Money::ZERO.is_positive());
        assert!(Money::from_minor(-1).is_negative());
    }
}
