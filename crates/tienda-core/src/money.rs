//! # Money Module
//!
//! Provides the `Money` type for every amount the pricing engine touches:
//! list prices, margins, costs, discounts and totals.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MARGIN BUDGETS MUST ADD UP EXACTLY                                     │
//! │                                                                         │
//! │  available margin  = Σ (max_margin − min_margin) × qty                 │
//! │  implicit discount = Σ (list_price − custom_price) × qty               │
//! │  global discount  ≤ available − implicit                               │
//! │                                                                         │
//! │  With floats, 0.1 + 0.2 ≠ 0.3 and a discount equal to the remaining    │
//! │  budget can be rejected (or accepted) by a rounding artifact.          │
//! │  With integer cents the comparison is exact.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tienda_core::money::Money;
//!
//! let list_price = Money::from_cents(10_000); // 100.00
//! let max_margin = Money::from_cents(3_000);  // 30.00
//!
//! let unit_cost = list_price - max_margin;
//! assert_eq!(unit_cost.cents(), 7_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate differences (e.g. margin left after
///   custom prices) may go negative before being clamped
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Newtype serde**: serialized as a bare integer of cents
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Zero money value.
    pub const ZERO: Money = Money(0);

    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use tienda_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money::ZERO
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

    /// Multiplies a unit amount by a line quantity, `None` on overflow.
    ///
    /// ```rust
    /// use tienda_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(5_000);
    /// assert_eq!(unit_price.checked_mul_quantity(3), Some(Money::from_cents(15_000)));
    /// assert_eq!(unit_price.checked_mul_quantity(i64::MAX), None);
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(&self, other: Money) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Floors the value at zero.
    ///
    /// Used wherever a derived amount (remaining margin, final total) must
    /// never be reported as negative.
    #[inline]
    pub fn non_negative(self) -> Self {
        self.max(Money::ZERO)
    }

    /// Clamps the value into `[low, high]`.
    ///
    /// Unlike [`Ord::clamp`] this never panics: when `high < low` the result
    /// is `low`.
    #[inline]
    pub fn clamp_between(self, low: Money, high: Money) -> Self {
        if self > high {
            high.max(low)
        } else if self < low {
            low
        } else {
            self
        }
    }

    /// Computes the tax to add to a tax-exclusive amount so that the tax is
    /// exactly `rate` of the tax-inclusive total.
    ///
    /// ## Formula
    /// ```text
    /// tax = amount / (1 − rate) − amount
    ///     = amount × bps / (10000 − bps)
    /// ```
    /// Rounded half away from zero to the cent. A zero rate, or a rate of
    /// 100% or more, yields no tax. `None` when the tax does not fit in
    /// `i64` cents (a 99.99% rate multiplies the amount by 9999).
    ///
    /// ```rust
    /// use tienda_core::money::Money;
    /// use tienda_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(15_000);        // 150.00
    /// let tax = subtotal.gross_up_tax(TaxRate::from_bps(2_000)); // 20%
    /// assert_eq!(tax, Some(Money::from_cents(3_750)));  // 37.50
    /// ```
    pub fn gross_up_tax(&self, rate: TaxRate) -> Option<Money> {
        if !rate.is_grossable() {
            return Some(Money::ZERO);
        }

        // i128: cents × bps overflows i64 long before realistic totals do
        let numerator = self.0 as i128 * rate.bps() as i128;
        let denominator = (TaxRate::FULL_BPS - rate.bps()) as i128;
        i64::try_from(div_round_half_away(numerator, denominator))
            .ok()
            .map(Money::from_cents)
    }
}

/// Integer division rounding half away from zero. `denominator` must be > 0.
fn div_round_half_away(numerator: i128, denominator: i128) -> i128 {
    let half_up = (numerator.abs() * 2 + denominator) / (denominator * 2);
    if numerator < 0 {
        -half_up
    } else {
        half_up
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering for logs and debugging.
///
/// Currency symbols and localization belong to the client.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.units().abs(), self.cents_part())
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
        iter.fold(Money::ZERO, Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
