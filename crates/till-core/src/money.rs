//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  0.1 + 0.2 = 0.30000000000000004                                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Prices, line totals and sale totals are whole numbers of the        │
//! │    smallest currency unit. Shillings have none, so 3500 = UGX 3,500.   │
//! │    Dollars have two, so 1099 = $10.99.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::{CurrencyFormat, Money};
//!
//! let price = Money::from_minor(3500);
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.minor(), 10500);
//!
//! let ugx = CurrencyFormat::new("UGX", 0);
//! assert_eq!(ugx.format(line), "UGX 10,500");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: profit can be negative while a product is being priced
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Checked multiplication** for line totals, since quantities come from
///   user input
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
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

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(3500);
    /// assert_eq!(unit_price.multiply_quantity(4).minor(), 14000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Adds two values, returning `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Currency Formatting
// =============================================================================

/// How money is rendered on receipts and in reports.
///
/// ## Note
/// Thousands are grouped with commas. The symbol is followed by a space,
/// matching how shilling amounts are printed ("UGX 3,500").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrencyFormat {
    /// Symbol or ISO code printed before the amount.
    pub symbol: String,
    /// Number of minor-unit digits (0 for UGX, 2 for USD).
    pub decimals: u8,
}

impl CurrencyFormat {
    /// Creates a new currency format.
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        CurrencyFormat {
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Formats an amount.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::{CurrencyFormat, Money};
    ///
    /// let usd = CurrencyFormat::new("$", 2);
    /// assert_eq!(usd.format(Money::from_minor(123456)), "$ 1,234.56");
    /// assert_eq!(usd.format(Money::from_minor(-5)), "-$ 0.05");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let divisor = 10_i64.pow(self.decimals as u32);
        let abs = amount.minor().unsigned_abs();
        let whole = abs / divisor as u64;
        let frac = abs % divisor as u64;

        let sign = if amount.is_negative() { "-" } else { "" };
        let grouped = group_thousands(whole);

        if self.decimals > 0 {
            format!(
                "{}{} {}.{:0width$}",
                sign,
                self.symbol,
                grouped,
                frac,
                width = self.decimals as usize
            )
        } else {
            format!("{}{} {}", sign, self.symbol, grouped)
        }
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat::new("UGX", 0)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the raw minor units; use [`CurrencyFormat`] for receipts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 3500].into_iter().map(Money::from_minor).sum();
        assert_eq!(total.minor(), 3850);
    }

    #[test]
    fn test_checked_multiply_overflow() {
        let huge = Money::from_minor(i64::MAX / 2);
        assert!(huge.checked_multiply_quantity(3).is_none());
        assert_eq!(
            Money::from_minor(3500).checked_multiply_quantity(4),
            Some(Money::from_minor(14000))
        );
    }

    #[test]
    fn test_format_shillings() {
        let ugx = CurrencyFormat::default();
        assert_eq!(ugx.format(Money::from_minor(0)), "UGX 0");
        assert_eq!(ugx.format(Money::from_minor(3500)), "UGX 3,500");
        assert_eq!(ugx.format(Money::from_minor(1234567)), "UGX 1,234,567");
        assert_eq!(ugx.format(Money::from_minor(-2000)), "-UGX 2,000");
    }

    #[test]
    fn test_format_with_decimals() {
        let usd = CurrencyFormat::new("$", 2);
        assert_eq!(usd.format(Money::from_minor(1099)), "$ 10.99");
        assert_eq!(usd.format(Money::from_minor(1)), "$ 0.01");
        assert_eq!(usd.format(Money::from_minor(100000)), "$ 1,000.00");
    }
}
