//! # Money Module
//!
//! Provides the `Money` type and the ITBIS arithmetic helpers.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing payments as floats drifts:                                     │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A balance of 600.00 paid as 400.10 + 199.90 may leave 1e-13 "owed",   │
//! │  and the sale never reaches `completed`.                                │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is an i64 count of centavos. Totals are exact.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ITBIS Rounding
//! ITBIS is rounded half-up to the centavo **per line**, at the moment the
//! line's tax is computed. Aggregates are plain integer sums of the already
//! rounded line amounts and are never re-rounded.
//!
//! ```rust
//! use ledger_core::money::{itbis, line_total, Money};
//! use ledger_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(20000); // RD$200.00
//! let tax = itbis(subtotal, TaxRate::ITBIS);
//! assert_eq!(tax.cents(), 3600);
//!
//! let total = line_total(2, Money::from_cents(10000), tax);
//! assert_eq!(total.cents(), 23600);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (1/100 of a Dominican peso).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences such as `total - total_paid` are computed
///   before being checked against zero
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as the raw integer**: the UI divides by 100 for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ```rust
    /// use ledger_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // RD$10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from pesos and centavos.
    ///
    /// For negative amounts only the major part carries the sign:
    /// `from_major_minor(-5, 50)` is -RD$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Creates a Money value from whole pesos.
    #[inline]
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos * 100)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-peso portion.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavo portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        std::cmp::min(self, other)
    }

    /// Returns `self - other`, floored at zero.
    #[inline]
    pub fn saturating_sub(self, other: Money) -> Money {
        if other >= self {
            Money::zero()
        } else {
            Money(self.0 - other.0)
        }
    }

    /// Calculates tax with half-up rounding to the centavo.
    ///
    /// ## Implementation
    /// Integer math on basis points: `(|amount| * bps + 5000) / 10000`,
    /// with the sign restored afterwards so that negative amounts round
    /// symmetrically (half away from zero).
    ///
    /// ```rust
    /// use ledger_core::money::Money;
    /// use ledger_core::types::TaxRate;
    ///
    /// // RD$0.25 × 18% = RD$0.045 → RD$0.05
    /// let tax = Money::from_cents(25).calculate_tax(TaxRate::ITBIS);
    /// assert_eq!(tax.cents(), 5);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 prevents overflow on large amounts
        let magnitude = (self.0.unsigned_abs() as i128 * rate.bps() as i128 + 5000) / 10000;
        let signed = if self.0 < 0 { -magnitude } else { magnitude };
        Money::from_cents(signed as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// Unchecked; amounts coming from user input go through
    /// [`checked_line_subtotal`] first.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// `None` on i64 overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `None` on i64 overflow.
    #[inline]
    pub const fn checked_mul(self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums amounts, `None` if any partial sum overflows.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }
}

// =============================================================================
// ITBIS Helpers
// =============================================================================

/// `quantity × unit_price`, before tax.
#[inline]
pub fn line_subtotal(quantity: i64, unit_price: Money) -> Money {
    unit_price.multiply_quantity(quantity)
}

/// `quantity × unit_price`, `None` when it does not fit in an i64.
#[inline]
pub fn checked_line_subtotal(quantity: i64, unit_price: Money) -> Option<Money> {
    unit_price.checked_mul(quantity)
}

/// ITBIS on a line subtotal, rounded half-up to the centavo.
#[inline]
pub fn itbis(subtotal: Money, rate: TaxRate) -> Money {
    subtotal.calculate_tax(rate)
}

/// `quantity × unit_price + itbis`.
#[inline]
pub fn line_total(quantity: i64, unit_price: Money, itbis_amount: Money) -> Money {
    line_subtotal(quantity, unit_price) + itbis_amount
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display as `RD$1,234.56`. Debug/log output only; the UI formats its own.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.pesos().abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "{}RD${}.{:02}", sign, grouped, self.cents_part())
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
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
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
