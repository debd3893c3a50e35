//! # Money
//!
//! Catalog prices are stored as integer cents (`price_cents`,
//! `special_price_cents`). `Money` wraps those cents for the one place the
//! catalog does arithmetic on them: bundle pricing.
//!
//! ```text
//! KIT-01 = A × 2 @ 7.50 (special) + B × 1 @ 10.00
//!        = 750 × 2 + 1000 × 1 = 2500 cents → "$25.00"
//! ```
//!
//! ```rust
//! use atlas_core::money::Money;
//!
//! let kit: Money = [Money::from_cents(750) * 2, Money::from_cents(1000)]
//!     .into_iter()
//!     .sum();
//! assert_eq!(kit.cents(), 2500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Mul;
use ts_rs::TS;

/// An amount in cents. Zero by default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// `$d.cc`, with a leading `-` for negative amounts. Used in logs and the
/// seed output only.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Unit price times a component quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.map(|m| m.0).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(2500).to_string(), "$25.00");
        assert_eq!(Money::from_cents(1999).to_string(), "$19.99");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
    }

    #[test]
    fn test_line_totals_sum_exactly() {
        // 3 × 0.10 is exactly 0.30
        let total: Money = (0..3).map(|_| Money::from_cents(10)).sum();
        assert_eq!(total.cents(), 30);
        assert_eq!((Money::from_cents(10) * 3), total);

        let empty: Money = std::iter::empty::<Money>().sum();
        assert!(empty.is_zero());
        assert_eq!(empty, Money::default());
    }
}
