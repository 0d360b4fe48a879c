//! # Money Module
//!
//! Provides the `Money` type for handling prices and purchase totals.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Prices are rounded to 2 fractional digits ONCE, when parsed,        │
//! │    and every total after that is exact integer math.                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sweetshop_core::money::Money;
//!
//! let price = Money::from_cents(1000);           // $10.00
//! let parsed: Money = "9.999".parse().unwrap(); // rounds to $10.00
//! assert_eq!(price, parsed);
//!
//! let total = price.multiply_quantity(5).unwrap();
//! assert_eq!(total.cents(), 5000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences between values can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serializes as cents**: the wire form is an integer, never a float
///
/// ## Where Money is Used
/// ```text
/// Item.price_cents ──┬──► Purchase unit price (snapshot) ──► Purchase total
///                    │
///                    └──► Stats: Σ price × quantity ──► average unit price
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use sweetshop_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies money by a quantity.
    ///
    /// Returns `None` on overflow instead of wrapping.
    ///
    /// ## Example
    /// ```rust
    /// use sweetshop_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1000); // Ladoo at $10.00
    /// let total = unit_price.multiply_quantity(5).unwrap();
    /// assert_eq!(total.cents(), 5000); // $50.00
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Divides by `divisor`, rounding half away from zero to the cent.
    ///
    /// A zero divisor yields zero: the average price of an empty
    /// inventory is $0.00, not an error.
    ///
    /// ## Example
    /// ```rust
    /// use sweetshop_core::money::Money;
    ///
    /// // $10.00 spread over 3 units = $3.33
    /// assert_eq!(Money::from_cents(1000).divide_rounded(3).cents(), 333);
    /// // $0.05 over 2 units = 2.5 cents → 3 cents
    /// assert_eq!(Money::from_cents(5).divide_rounded(2).cents(), 3);
    /// assert_eq!(Money::from_cents(5).divide_rounded(0).cents(), 0);
    /// ```
    pub fn divide_rounded(&self, divisor: i64) -> Money {
        if divisor == 0 {
            return Money::zero();
        }

        let n = self.0 as i128;
        let d = divisor as i128;
        let q = n / d;
        let r = n % d;
        let rounded = if (r.abs() * 2) >= d.abs() {
            if (n < 0) == (d < 0) {
                q + 1
            } else {
                q - 1
            }
        } else {
            q
        };
        Money(rounded as i64)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a decimal amount such as `"10"`, `"10.5"` or `"10.005"`.
///
/// ## Rounding
/// Digits beyond the second fractional place are rounded half-up on the
/// magnitude: `"10.005"` → 1001 cents, `"10.0049"` → 1000 cents.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: format!("'{}' is not a decimal amount", raw),
        };

        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let mut frac_digits = frac.bytes().map(|b| (b - b'0') as i64);
        let tenths = frac_digits.next().unwrap_or(0);
        let hundredths = frac_digits.next().unwrap_or(0);
        let round_up = frac_digits.next().map_or(0, |d| i64::from(d >= 5));

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + round_up))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as a plain decimal with two fractional digits.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(5000).to_string(), "50.00");
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_parse_rounds_to_two_places() {
        assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().cents(), 1050);
        assert_eq!("10.005".parse::<Money>().unwrap().cents(), 1001);
        assert_eq!("10.0049".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("9.999".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!(".5".parse::<Money>().unwrap().cents(), 50);
        assert_eq!("-2.25".parse::<Money>().unwrap().cents(), -225);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!(".".parse::<Money>().is_err());
        assert!("ten".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("1e5".parse::<Money>().is_err());
    }

    #[test]
    fn test_multiply_quantity_overflow() {
        assert_eq!(Money::from_cents(299).multiply_quantity(3), Some(Money::from_cents(897)));
        assert_eq!(Money::from_cents(i64::MAX).multiply_quantity(2), None);
    }

    #[test]
    fn test_divide_rounded() {
        assert_eq!(Money::from_cents(1000).divide_rounded(3).cents(), 333);
        assert_eq!(Money::from_cents(2000).divide_rounded(3).cents(), 667);
        assert_eq!(Money::from_cents(-5).divide_rounded(2).cents(), -3);
        assert_eq!(Money::from_cents(1234).divide_rounded(0), Money::zero());
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 5].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 355);
    }
}
