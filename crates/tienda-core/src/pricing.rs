//! # Price List Resolution
//!
//! Decides which [`PriceEntry`] applies to a product under the cart's
//! selected price list.
//!
//! ## Fallback Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product.prices[active list]   ── max_margin > 0? ──► use it            │
//! │            │ no / absent                                                │
//! │            ▼                                                            │
//! │  product.prices[default list]  ── present? ─────────► use it            │
//! │            │ absent                                                     │
//! │            ▼                                                            │
//! │  PriceEntry::UNPRICED (all zero) ──► product cannot be sold             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Non-default lists are promotional overlays: a list without a configured
//! margin for a product means "inherit from default", not an error.

use crate::types::{PriceEntry, PriceLists, Product};

/// Resolves the price entry for `product` under `active_list_id`.
///
/// `None` selects the default list directly. This function never fails;
/// an all-zero result means the product is unpriced.
///
/// ## Example
/// ```rust
/// use std::collections::BTreeMap;
/// use tienda_core::money::Money;
/// use tienda_core::pricing::resolve_price;
/// use tienda_core::types::{PriceEntry, PriceList, PriceLists, Product};
///
/// let lists = PriceLists::new(vec![
///     PriceList { id: "retail".into(), name: "Retail".into(), is_default: true },
///     PriceList { id: "promo".into(), name: "Promo".into(), is_default: false },
/// ]).unwrap();
///
/// let retail = PriceEntry::new(Money::from_units(100), Money::from_units(30), Money::from_units(10));
/// let product = Product {
///     id: "p1".into(),
///     sku: "P1".into(),
///     name: "Thing".into(),
///     is_active: true,
///     prices: BTreeMap::from([
///         ("retail".to_string(), retail),
///         ("promo".to_string(), PriceEntry::new(Money::from_units(90), Money::ZERO, Money::ZERO)),
///     ]),
///     stock_on_hand: None,
/// };
///
/// // The promo entry has no margin, so the default list wins
/// assert_eq!(resolve_price(&product, Some("promo"), &lists), retail);
/// ```
pub fn resolve_price(
    product: &Product,
    active_list_id: Option<&str>,
    price_lists: &PriceLists,
) -> PriceEntry {
    active_list_id
        .and_then(|id| product.price_in(id))
        .filter(|entry| entry.is_active())
        .or_else(|| product.price_in(&price_lists.default_list().id))
        .copied()
        .unwrap_or(PriceEntry::UNPRICED)
}

/// Whether the product can be put in a cart under the given list.
pub fn is_sellable(product: &Product, active_list_id: Option<&str>, price_lists: &PriceLists) -> bool {
    !resolve_price(product, active_list_id, price_lists).is_unpriced()
}

// =============================================================================
// Unit Tests
// =============================================================================
