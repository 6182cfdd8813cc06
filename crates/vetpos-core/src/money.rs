//! # Money Module
//!
//! Integer-cent money. Every price, cost, drawer amount and sale total in
//! VetPOS is a `Money` (or its raw `i64` cents when stored).
//!
//! ## Why Integer Cents?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A drawer closes with "difference = final − expected".                  │
//! │                                                                         │
//! │  With floats:   0.1 + 0.2 − 0.3 = 5.55e-17    → phantom difference     │
//! │  With cents:    10 + 20 − 30    = 0           → drawer balances         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vetpos_core::money::Money;
//!
//! let vaccine = Money::from_cents(32_050); // $320.50
//! let two = vaccine * 2;
//! assert_eq!(two.cents(), 64_100);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Monetary value in cents. Signed so refunds and drawer shortfalls fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use vetpos_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole currency units, truncated toward zero.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Cent portion, always 0-99.
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns zero for negative values.
    ///
    /// Used where a price or cost must never drop below zero after an adjustment.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Tax on this amount, rounded half up.
    ///
    /// ```rust
    /// use vetpos_core::money::Money;
    /// use vetpos_core::types::TaxRate;
    ///
    /// // $10.00 at 8.25% = $0.825 → $0.83
    /// let tax = Money::from_cents(1000).calculate_tax(TaxRate::from_bps(825));
    /// assert_eq!(tax.cents(), 83);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(round_div(self.0 as i128 * rate.bps() as i128, 10_000) as i64)
    }

    /// Scales the amount by `(10000 + delta_bps) / 10000`, rounded half up.
    ///
    /// A negative `delta_bps` shrinks the amount. `None` when the result
    /// does not fit in `i64`.
    ///
    /// ```rust
    /// use vetpos_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(10_000).checked_scale_bps(1000).unwrap().cents(), 11_000);
    /// assert_eq!(Money::from_cents(10_000).checked_scale_bps(-2500).unwrap().cents(), 7_500);
    /// assert!(Money::from_cents(i64::MAX).checked_scale_bps(10_000).is_none());
    /// ```
    pub fn checked_scale_bps(&self, delta_bps: i64) -> Option<Money> {
        let factor = 10_000i128 + delta_bps as i128;
        let scaled = round_div(self.0 as i128 * factor, 10_000);
        i64::try_from(scaled).ok().map(Money)
    }

    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Saturates at the `i64` bounds; callers validate quantities and unit
    /// prices before multiplying.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

/// Integer division rounding half away from zero.
pub(crate) fn round_div(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.minor())
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
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
