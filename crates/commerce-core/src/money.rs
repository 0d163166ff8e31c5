//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BALANCE ARITHMETIC MUST BE EXACT                                       │
//! │                                                                         │
//! │  total_price = Σ quantity × unit_price                                  │
//! │  remaining   = balance − total_price                                    │
//! │                                                                         │
//! │  Both are compared against zero to accept or reject a checkout.         │
//! │  Floating point could turn an exact 0 into -0.0000001 and reject a      │
//! │  valid order, so every amount is an i64 in the smallest currency unit.  │
//! │                                                                         │
//! │  Overflow is reported, never wrapped: see `checked_*`.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use commerce_core::money::Money;
//!
//! let unit_price = Money::new(1000);
//! let line_total = unit_price.checked_mul_quantity(3).unwrap();
//! assert_eq!(line_total.amount(), 3000);
//!
//! let balance = Money::new(5000);
//! assert_eq!((balance - line_total).amount(), 2000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: a difference can go negative, which is exactly how an
///   insufficient balance is detected
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serde transparent**: serializes as a bare number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from an amount in the smallest currency unit.
    ///
    /// ## Example
    /// ```rust
    /// use commerce_core::money::Money;
    ///
    /// let price = Money::new(1000);
    /// assert_eq!(price.amount(), 1000);
    /// ```
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use commerce_core::money::Money;
    ///
    /// let unit_price = Money::new(299);
    /// assert_eq!(unit_price.checked_mul_quantity(3), Some(Money::new(897)));
    /// assert_eq!(Money::new(i64::MAX).checked_mul_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Subtracts two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display groups thousands: `1234567` → `1,234,567`.
///
/// ## Note
/// For logs and CLI output. No currency symbol: the system is single-currency.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            write!(f, "-{}", grouped)
        } else {
            f.write_str(&grouped)
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::new(0).to_string(), "0");
        assert_eq!(Money::new(999).to_string(), "999");
        assert_eq!(Money::new(3000).to_string(), "3,000");
        assert_eq!(Money::new(1234567).to_string(), "1,234,567");
        assert_eq!(Money::new(-5000).to_string(), "-5,000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(5000);
        let b = Money::new(3000);

        assert_eq!((a + b).amount(), 8000);
        assert_eq!((a - b).amount(), 2000);
        assert!((b - a).is_negative());

        let mut c = Money::zero();
        c += a;
        c -= b;
        assert_eq!(c, Money::new(2000));
    }

    #[test]
    fn test_checked_overflow() {
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
        assert_eq!(Money::new(i64::MIN).checked_sub(Money::new(1)), None);
        assert_eq!(Money::new(i64::MAX / 2 + 1).checked_mul_quantity(2), None);
        assert_eq!(Money::new(1000).checked_mul_quantity(3), Some(Money::new(3000)));
    }

    #[test]
    fn test_sum() {
        let total: Money = [1000, 2000, 500].into_iter().map(Money::new).sum();
        assert_eq!(total.amount(), 3500);
        assert!(std::iter::empty::<Money>().sum::<Money>().is_zero());
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Money::new(3000)).unwrap(), "3000");
    }
}
