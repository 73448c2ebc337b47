//! # Checkout
//!
//! Freezes a cart into the document handed to the commit gateway.
//!
//! ## Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart empty?                      → EmptyCart                           │
//! │  line quantity < 1?               → InvalidCart                         │
//! │  line unpriced?                   → InvalidCart                         │
//! │  override outside envelope?       → InvalidCart                         │
//! │  global discount over budget?     → InvalidCart                         │
//! │  amounts out of the cents range?  → AmountOverflow                      │
//! │  subtotal + tax − discount < 0?   → InvalidCart                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart mutations already keep these invariants; checkout re-verifies them
//! on the snapshot it hands out. Stock is not checked here: the gateway
//! owns the authoritative figure.

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::discount::MarginBudget;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::totals::{compute, Totals};
use crate::types::PriceLists;

/// One line of a committed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    /// Unit price actually charged (custom price or list price).
    pub effective_price: Money,
    pub unit_cost: Money,
    pub list_price: Money,
    /// Effective price × quantity.
    pub line_total: Money,
}

/// A verified, immutable cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub lines: Vec<FinalizedLine>,
    pub totals: Totals,
    /// `None` when the default list was in effect.
    pub price_list_id: Option<String>,
    pub client_id: Option<String>,
}

impl Checkout {
    /// Builds the checkout document for `cart`.
    pub fn from_cart(cart: &Cart, price_lists: &PriceLists) -> CoreResult<Checkout> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let priced = cart.priced_lines(price_lists);
        let mut budget = MarginBudget::new();
        let mut lines = Vec::with_capacity(priced.len());

        for (line, priced_line) in cart.lines().iter().zip(&priced) {
            let product_id = line.product_id();

            if line.quantity < 1 {
                return Err(invalid(format!(
                    "line {} has quantity {}",
                    product_id, line.quantity
                )));
            }

            let entry = priced_line.entry;
            if entry.is_unpriced() {
                return Err(invalid(format!("line {} is unpriced", product_id)));
            }

            if let Some(price) = priced_line.custom_price {
                if !entry.admits(price) {
                    return Err(invalid(format!(
                        "custom price {} for {} is outside [{}, {}]",
                        price,
                        product_id,
                        entry.min_price(),
                        entry.list_price
                    )));
                }
            }

            budget.add_line(&entry, priced_line.custom_price, line.quantity)?;
            lines.push(FinalizedLine {
                product_id: product_id.to_string(),
                sku: line.product.sku.clone(),
                name: line.product.name.clone(),
                quantity: line.quantity,
                effective_price: priced_line.effective_price(),
                unit_cost: entry.unit_cost(),
                list_price: entry.list_price,
                line_total: priced_line.line_total()?,
            });
        }

        let totals = compute(&priced, cart.tax_rate(), cart.requested_discount())?;

        if !budget.admits(totals.global_discount) {
            return Err(invalid(format!(
                "global discount {} exceeds remaining margin {}",
                totals.global_discount,
                budget.remaining()
            )));
        }

        let unclamped = totals.subtotal + totals.tax_amount - totals.global_discount;
        if unclamped.is_negative() {
            return Err(invalid(format!("final total would be {}", unclamped)));
        }

        Ok(Checkout {
            lines,
            totals,
            price_list_id: cart.price_list_id().map(str::to_string),
            client_id: cart.client_id().map(str::to_string),
        })
    }

    pub fn item_count(&self) -> usize {
        self.lines.len()
    }
}

fn invalid(reason: String) -> CoreError {
    CoreError::InvalidCart { reason }
}

// =============================================================================
// Unit Tests
// =============================================================================
