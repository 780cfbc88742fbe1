//! Loyalty milestone rule.
//!
//! A customer earns a fixed discount on every Nth order they place. The rule
//! only looks at how many orders already exist for the customer key; it never
//! considers how much was spent.
//!
//! Customer keys are free-text names, so two people who both type "Client"
//! share one counter.

use serde::{Deserialize, Serialize};

use super::money::Money;

/// Periodic Nth-order discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyPolicy {
    interval: u32,
    discount: Money,
}

impl LoyaltyPolicy {
    /// Milestone interval used when none is configured.
    pub const DEFAULT_INTERVAL: u32 = 10;

    /// Discount granted at each milestone when none is configured (minor units).
    pub const DEFAULT_DISCOUNT: Money = Money::from_minor(10);

    /// Create a policy.
    ///
    /// Returns `None` when `interval` is zero or `discount` is negative.
    #[must_use]
    pub const fn new(interval: u32, discount: Money) -> Option<Self> {
        if interval == 0 || discount.is_negative() {
            return None;
        }
        Some(Self { interval, discount })
    }

    /// Milestone interval (every `interval`-th order qualifies).
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Discount amount granted at a milestone.
    #[must_use]
    pub const fn discount(&self) -> Money {
        self.discount
    }

    /// Discount for an order given how many orders the customer placed before it.
    ///
    /// The incoming order is ordinal `prior_orders + 1`; it qualifies when that
    /// ordinal is a multiple of the interval. A first order never qualifies
    /// unless the interval is 1.
    #[must_use]
    pub fn discount_for(&self, prior_orders: u64) -> Money {
        let ordinal = prior_orders.saturating_add(1);
        if ordinal % u64::from(self.interval) == 0 {
            self.discount
        } else {
            Money::ZERO
        }
    }
}

impl Default for LoyaltyPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            discount: Self::DEFAULT_DISCOUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_order_never_qualifies() {
        assert_eq!(LoyaltyPolicy::default().discount_for(0), Money::ZERO);
    }

    #[test]
    fn test_every_tenth_order_qualifies() {
        let policy = LoyaltyPolicy::default();
        for prior in 0..100_u64 {
            let expected = if (prior + 1) % 10 == 0 {
                Money::from_minor(10)
            } else {
                Money::ZERO
            };
            assert_eq!(policy.discount_for(prior), expected, "prior = {prior}");
        }
    }

    #[test]
    fn test_ninth_prior_order_gets_discount() {
        assert_eq!(
            LoyaltyPolicy::default().discount_for(9),
            Money::from_minor(10)
        );
        assert_eq!(LoyaltyPolicy::default().discount_for(10), Money::ZERO);
    }

    #[test]
    fn test_custom_interval() {
        let policy = LoyaltyPolicy::new(3, Money::from_minor(500));
        assert!(policy.is_some());
        let policy = policy.unwrap_or_default();
        assert_eq!(policy.discount_for(2), Money::from_minor(500));
        assert_eq!(policy.discount_for(3), Money::ZERO);
        assert_eq!(policy.discount_for(5), Money::from_minor(500));
    }

    #[test]
    fn test_invalid_policies_rejected() {
        assert!(LoyaltyPolicy::new(0, Money::from_minor(10)).is_none());
        assert!(LoyaltyPolicy::new(10, Money::from_minor(-1)).is_none());
    }
}
