//! # Cart Ledger
//!
//! The cart aggregate shared by the sales terminal and the quotation
//! builder, and its invariant-preserving mutations.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operation              Effect                                          │
//! │  ─────────              ──────                                          │
//! │  add(product)           qty += 1, or new line with qty 1               │
//! │                         (Unpriced / StockExceeded → no mutation)       │
//! │  set_quantity(id, n)    n ≤ 0 → remove; else qty = n (clamped to stock)│
//! │  remove(id)             line + its override, atomically; idempotent    │
//! │  set_custom_price(...)  one write to the override map                  │
//! │  select_price_list(..)  drops overrides outside the new envelope       │
//! │  clear()                lines, overrides, tax, discount, client        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by product id and every quantity is in
//!   `1..=MAX_ITEM_QUANTITY`
//! - Every override key has a line
//! - Every override lies in `[min_price, list_price)` of the line's
//!   currently resolved entry
//!
//! ## Stock Policy
//! The sales terminal sells from stock and clamps quantities to
//! `stock_on_hand`; the quotation builder may quote more than is on hand.
//! Both use the same cart, parameterized by [`StockPolicy`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::custom_price::{validate_custom_price, validate_custom_price_input, OverrideChange};
use crate::error::{CoreError, CoreResult};
use crate::input::{normalize_discount, normalize_tax_rate, validate_quantity};
use crate::money::Money;
use crate::pricing::{is_sellable, resolve_price};
use crate::totals::PricedLine;
use crate::types::{PriceEntry, PriceLists, Product, TaxRate};

// =============================================================================
// Stock Policy
// =============================================================================

/// Whether cart quantities are limited by stock on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Sales terminal: never put more units in the cart than are in stock.
    #[default]
    Enforce,
    /// Quotation builder: quantities are not limited.
    Unlimited,
}

// =============================================================================
// Lines and Overrides
// =============================================================================

/// A product and how many units of it are in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Catalog data captured when the line was created.
    pub product: Product,
    pub quantity: i64,
}

impl CartLine {
    #[inline]
    pub fn product_id(&self) -> &str {
        &self.product.id
    }
}

/// A validated manual unit price for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPriceOverride {
    pub new_price: Money,
}

/// Result of [`Cart::set_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuantityChange {
    Updated { quantity: i64 },
    /// Requested more than the stock on hand; the maximum was applied.
    Clamped { requested: i64, applied: i64 },
    Removed,
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart aggregate.
///
/// All fields are private so every mutation goes through a method that
/// keeps the invariants listed in the module docs.
#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
    overrides: BTreeMap<String, CustomPriceOverride>,
    /// `None` selects the catalog's default list.
    price_list_id: Option<String>,
    tax_rate_input: String,
    discount_input: String,
    client_id: Option<String>,
    /// Tax-rate text restored by [`Cart::clear`].
    default_tax_rate_input: String,
    stock_policy: StockPolicy,
    created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new(stock_policy: StockPolicy) -> Self {
        Cart {
            lines: Vec::new(),
            overrides: BTreeMap::new(),
            price_list_id: None,
            tax_rate_input: String::new(),
            discount_input: String::new(),
            client_id: None,
            default_tax_rate_input: String::new(),
            stock_policy,
            created_at: Utc::now(),
        }
    }

    /// Sets the tax-rate text the cart starts with and returns to on clear.
    pub fn with_default_tax_rate(mut self, text: impl Into<String>) -> Self {
        self.default_tax_rate_input = text.into();
        self.tax_rate_input = self.default_tax_rate_input.clone();
        self
    }

    // -------------------------------------------------------------------------
    // Line mutations
    // -------------------------------------------------------------------------

    /// Adds one unit of `product`.
    ///
    /// ## Behavior
    /// - Product already in cart: quantity + 1
    /// - Otherwise: new line with quantity 1
    ///
    /// ## Errors (cart untouched)
    /// - `ProductInactive` for products flagged inactive
    /// - `Unpriced` when neither the selected nor the default list prices it
    /// - `Validation(OutOfRange)` when the line is already at
    ///   [`MAX_ITEM_QUANTITY`](crate::MAX_ITEM_QUANTITY)
    /// - `StockExceeded` under [`StockPolicy::Enforce`] when the new
    ///   quantity would exceed stock on hand
    ///
    /// ## Returns
    /// The line's new quantity.
    pub fn add(&mut self, product: &Product, price_lists: &PriceLists) -> CoreResult<i64> {
        if !product.is_active {
            return Err(CoreError::ProductInactive(product.id.clone()));
        }

        if !is_sellable(product, self.price_list_id.as_deref(), price_lists) {
            return Err(CoreError::Unpriced {
                product_id: product.id.clone(),
            });
        }

        let requested = self.quantity_of(&product.id).unwrap_or(0) + 1;
        validate_quantity(requested)?;
        self.check_stock(product, requested)?;

        match self.line_mut(&product.id) {
            Some(line) => {
                line.quantity = requested;
                // Keep the freshest stock figure for later quantity edits
                line.product.stock_on_hand = product.stock_on_hand;
            }
            None => self.lines.push(CartLine {
                product: product.clone(),
                quantity: requested,
            }),
        }

        Ok(requested)
    }

    /// Sets the quantity of an existing line.
    ///
    /// ## Behavior
    /// - `quantity ≤ 0`: same as [`Cart::remove`]
    /// - Under [`StockPolicy::Enforce`], a quantity above stock is clamped
    ///   to the stock on hand and reported as [`QuantityChange::Clamped`]
    ///
    /// ## Errors (cart untouched)
    /// - `LineNotFound` when the product is not in the cart
    /// - `Validation(OutOfRange)` above [`MAX_ITEM_QUANTITY`](crate::MAX_ITEM_QUANTITY)
    /// - `StockExceeded` when there is no stock left to clamp to
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<QuantityChange> {
        if quantity <= 0 {
            self.remove(product_id);
            return Ok(QuantityChange::Removed);
        }
        validate_quantity(quantity)?;

        let enforce = self.stock_policy == StockPolicy::Enforce;
        let line = self
            .line_mut(product_id)
            .ok_or_else(|| CoreError::LineNotFound(product_id.to_string()))?;

        let applied = match line.product.stock_on_hand {
            Some(stock) if enforce && quantity > stock => {
                if stock <= 0 {
                    return Err(CoreError::StockExceeded {
                        product_id: product_id.to_string(),
                        available: stock.max(0),
                        requested: quantity,
                    });
                }
                stock
            }
            _ => quantity,
        };
        line.quantity = applied;

        if applied < quantity {
            Ok(QuantityChange::Clamped {
                requested: quantity,
                applied,
            })
        } else {
            Ok(QuantityChange::Updated { quantity })
        }
    }

    /// Removes a line and its override together.
    ///
    /// Removing a product that is not in the cart is a no-op.
    ///
    /// ## Returns
    /// Whether a line was removed.
    pub fn remove(&mut self, product_id: &str) -> bool {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id() != product_id);
        self.overrides.remove(product_id);
        self.lines.len() != initial_len
    }

    /// Empties the cart and resets tax rate, discount and client.
    ///
    /// The selected price list survives: it is a terminal setting, not part
    /// of a single sale.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.overrides.clear();
        self.tax_rate_input = self.default_tax_rate_input.clone();
        self.discount_input.clear();
        self.client_id = None;
        self.created_at = Utc::now();
    }

    // -------------------------------------------------------------------------
    // Custom prices
    // -------------------------------------------------------------------------

    /// Validates and applies a manual unit price for a line.
    ///
    /// ## Errors (cart untouched)
    /// - `LineNotFound`
    /// - `Pricing(BelowMinimumMargin | AboveListPrice | InvalidNumber)`
    pub fn set_custom_price(
        &mut self,
        product_id: &str,
        proposed: Money,
        price_lists: &PriceLists,
    ) -> CoreResult<OverrideChange> {
        let entry = self.entry_for(product_id, price_lists)?;
        let change = validate_custom_price(&entry, proposed)?;
        self.apply_override(product_id, change);
        Ok(change)
    }

    /// [`Cart::set_custom_price`] for a price typed as free text.
    pub fn set_custom_price_input(
        &mut self,
        product_id: &str,
        input: &str,
        price_lists: &PriceLists,
    ) -> CoreResult<OverrideChange> {
        let entry = self.entry_for(product_id, price_lists)?;
        let change = validate_custom_price_input(&entry, input)?;
        self.apply_override(product_id, change);
        Ok(change)
    }

    /// Drops a line's override, restoring its list price.
    pub fn reset_custom_price(&mut self, product_id: &str) -> bool {
        self.overrides.remove(product_id).is_some()
    }

    fn apply_override(&mut self, product_id: &str, change: OverrideChange) {
        match change {
            OverrideChange::Set(new_price) => {
                self.overrides
                    .insert(product_id.to_string(), CustomPriceOverride { new_price });
            }
            OverrideChange::Clear => {
                self.overrides.remove(product_id);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Cart-level settings
    // -------------------------------------------------------------------------

    /// Switches the active price list (`None` = default list).
    ///
    /// Overrides that fall outside the newly resolved envelope, or that now
    /// equal the new list price, are dropped so the override invariant
    /// holds.
    ///
    /// ## Returns
    /// Product ids whose override was dropped.
    pub fn select_price_list(
        &mut self,
        price_list_id: Option<&str>,
        price_lists: &PriceLists,
    ) -> CoreResult<Vec<String>> {
        if let Some(id) = price_list_id {
            if !price_lists.contains(id) {
                return Err(CoreError::UnknownPriceList(id.to_string()));
            }
        }

        self.price_list_id = price_list_id.map(str::to_string);
        Ok(self.retain_valid_overrides(price_lists))
    }

    fn retain_valid_overrides(&mut self, price_lists: &PriceLists) -> Vec<String> {
        let active = self.price_list_id.as_deref();
        let stale: Vec<String> = self
            .overrides
            .iter()
            .filter(|(id, o)| {
                match self.lines.iter().find(|l| l.product_id() == id.as_str()) {
                    Some(line) => {
                        let entry = resolve_price(&line.product, active, price_lists);
                        !entry.admits(o.new_price) || o.new_price == entry.list_price
                    }
                    None => true,
                }
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            self.overrides.remove(id);
        }
        stale
    }

    /// Stores the tax-rate field verbatim; it is normalized when totals are
    /// computed.
    pub fn set_tax_rate_input(&mut self, text: impl Into<String>) {
        self.tax_rate_input = text.into();
    }

    /// Stores the global-discount field verbatim.
    pub fn set_discount_input(&mut self, text: impl Into<String>) {
        self.discount_input = text.into();
    }

    pub fn select_client(&mut self, client_id: Option<String>) {
        self.client_id = client_id;
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id() == product_id)
    }

    fn line_mut(&mut self, product_id: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id() == product_id)
    }

    pub fn quantity_of(&self, product_id: &str) -> Option<i64> {
        self.line(product_id).map(|l| l.quantity)
    }

    pub fn overrides(&self) -> &BTreeMap<String, CustomPriceOverride> {
        &self.overrides
    }

    pub fn custom_price(&self, product_id: &str) -> Option<Money> {
        self.overrides.get(product_id).map(|o| o.new_price)
    }

    pub fn price_list_id(&self) -> Option<&str> {
        self.price_list_id.as_deref()
    }

    pub fn tax_rate_input(&self) -> &str {
        &self.tax_rate_input
    }

    pub fn discount_input(&self) -> &str {
        &self.discount_input
    }

    /// The tax rate field, normalized.
    pub fn tax_rate(&self) -> TaxRate {
        normalize_tax_rate(&self.tax_rate_input)
    }

    /// The requested global discount, normalized (before budget clamping).
    pub fn requested_discount(&self) -> Money {
        normalize_discount(&self.discount_input)
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn stock_policy(&self) -> StockPolicy {
        self.stock_policy
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of distinct products.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all line quantities.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The entry a line is priced with under the cart's selected list.
    pub fn resolved_entry(&self, line: &CartLine, price_lists: &PriceLists) -> PriceEntry {
        resolve_price(&line.product, self.price_list_id(), price_lists)
    }

    /// Custom price if the line has one, otherwise the resolved list price.
    pub fn effective_price(&self, line: &CartLine, price_lists: &PriceLists) -> Money {
        self.custom_price(line.product_id())
            .unwrap_or_else(|| self.resolved_entry(line, price_lists).list_price)
    }

    /// Resolves every line for the totals reduction.
    pub fn priced_lines(&self, price_lists: &PriceLists) -> Vec<PricedLine> {
        self.lines
            .iter()
            .map(|line| PricedLine {
                product_id: line.product_id().to_string(),
                quantity: line.quantity,
                entry: self.resolved_entry(line, price_lists),
                custom_price: self.custom_price(line.product_id()),
            })
            .collect()
    }

    fn entry_for(&self, product_id: &str, price_lists: &PriceLists) -> CoreResult<PriceEntry> {
        self.line(product_id)
            .map(|line| self.resolved_entry(line, price_lists))
            .ok_or_else(|| CoreError::LineNotFound(product_id.to_string()))
    }

    fn check_stock(&self, product: &Product, requested: i64) -> CoreResult<()> {
        if self.stock_policy == StockPolicy::Unlimited || product.can_sell(requested) {
            return Ok(());
        }
        Err(CoreError::StockExceeded {
            product_id: product.id.clone(),
            available: product.stock_on_hand.unwrap_or(0).max(0),
            requested,
        })
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new(StockPolicy::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
