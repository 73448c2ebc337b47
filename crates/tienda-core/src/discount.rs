//! # Discount Allocation
//!
//! The margin budget shared by custom prices and the global discount.
//!
//! ## The Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  available = Σ (max_margin − min_margin) × qty     (whole cart)         │
//! │  implicit  = Σ (list_price − custom_price) × qty   (overridden lines)   │
//! │                                                                         │
//! │  implicit + global_discount ≤ available                                 │
//! │                                                                         │
//! │  Custom prices are bounded per line (never below min_price), so they   │
//! │  can never spend more than their own line's margin. The global         │
//! │  discount is clamped to what is left: max(0, available − implicit).    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::PriceEntry;

/// Running margin accounting over a cart snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginBudget {
    available: Money,
    implicit: Money,
}

impl MarginBudget {
    pub fn new() -> Self {
        MarginBudget::default()
    }

    /// Accounts one cart line.
    ///
    /// `override_price` is the line's custom price, if it has one; lines
    /// without an override spend nothing.
    ///
    /// ## Errors
    /// `AmountOverflow` when a running sum leaves the cents range. The
    /// budget is left unchanged.
    pub fn add_line(
        &mut self,
        entry: &PriceEntry,
        override_price: Option<Money>,
        quantity: i64,
    ) -> CoreResult<()> {
        let line_margin = entry
            .max_margin
            .checked_sub(entry.min_margin)
            .and_then(|margin| margin.checked_mul_quantity(quantity));
        let line_erosion = match override_price {
            Some(price) => entry
                .list_price
                .checked_sub(price)
                .and_then(|erosion| erosion.checked_mul_quantity(quantity)),
            None => Some(Money::ZERO),
        };

        let available = line_margin.and_then(|m| self.available.checked_add(m));
        let implicit = line_erosion.and_then(|e| self.implicit.checked_add(e));
        match (available, implicit) {
            // remaining() subtracts the two
            (Some(available), Some(implicit)) if available.checked_sub(implicit).is_some() => {
                self.available = available;
                self.implicit = implicit;
                Ok(())
            }
            _ => Err(CoreError::AmountOverflow),
        }
    }

    /// Aggregate margin that discounts may consume.
    #[inline]
    pub fn available(&self) -> Money {
        self.available
    }

    /// Margin already consumed by custom prices.
    #[inline]
    pub fn implicit(&self) -> Money {
        self.implicit
    }

    /// Largest global discount the cart can still absorb. Never negative.
    #[inline]
    pub fn remaining(&self) -> Money {
        (self.available - self.implicit).non_negative()
    }

    /// Clamps a requested global discount to `[0, remaining]`.
    pub fn allocate(&self, requested: Money) -> Money {
        requested.clamp_between(Money::ZERO, self.remaining())
    }

    /// Whether `global_discount` keeps the combined erosion inside the budget.
    pub fn admits(&self, global_discount: Money) -> bool {
        !global_discount.is_negative() && global_discount <= self.remaining()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
