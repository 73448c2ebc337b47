//! # Custom Price Validation
//!
//! Gate for manually entered unit prices on a cart line.
//!
//! ## Bounds
//! ```text
//!   min_price = (list_price − max_margin) + min_margin
//!
//!   proposed < min_price       → BelowMinimumMargin { min_price }
//!   proposed > list_price      → AboveListPrice { list_price }
//!   proposed == list_price     → Clear   (line reverts to "no override")
//!   otherwise                  → Set(proposed)
//! ```
//!
//! Validation is pure; [`Cart::set_custom_price`](crate::cart::Cart::set_custom_price)
//! applies the resulting [`OverrideChange`] as a single write to the
//! override map.

use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::input::parse_hundredths;
use crate::money::Money;
use crate::types::PriceEntry;

/// What a validated custom price does to the override map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "price", rename_all = "snake_case")]
pub enum OverrideChange {
    /// Store `{ new_price }` for the line.
    Set(Money),
    /// Remove any override; the line charges its list price.
    Clear,
}

impl OverrideChange {
    /// The override price this change leaves in place, if any.
    pub fn price(&self) -> Option<Money> {
        match self {
            OverrideChange::Set(price) => Some(*price),
            OverrideChange::Clear => None,
        }
    }
}

/// Validates `proposed` against the line's resolved price entry.
pub fn validate_custom_price(
    resolved: &PriceEntry,
    proposed: Money,
) -> Result<OverrideChange, PricingError> {
    if proposed.is_negative() {
        return Err(PricingError::InvalidNumber {
            input: proposed.to_string(),
        });
    }

    let min_price = resolved.min_price();
    if proposed < min_price {
        return Err(PricingError::BelowMinimumMargin { min_price });
    }

    if proposed > resolved.list_price {
        return Err(PricingError::AboveListPrice {
            list_price: resolved.list_price,
        });
    }

    if proposed == resolved.list_price {
        Ok(OverrideChange::Clear)
    } else {
        Ok(OverrideChange::Set(proposed))
    }
}

/// Same as [`validate_custom_price`] for a price typed as free text.
pub fn validate_custom_price_input(
    resolved: &PriceEntry,
    input: &str,
) -> Result<OverrideChange, PricingError> {
    let cents = parse_hundredths(input)
        .filter(|cents| *cents >= 0)
        .ok_or_else(|| PricingError::InvalidNumber {
            input: input.to_string(),
        })?;
    validate_custom_price(resolved, Money::from_cents(cents))
}

// =============================================================================
// Unit Tests
// =============================================================================
