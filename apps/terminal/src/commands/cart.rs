//! # Cart Commands
//!
//! Commands for cart manipulation. Every command returns the full cart view
//! with freshly computed totals, so the client never recomputes prices.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Priced / │────►│Committed │       │
//! │  │  Cart    │     │          │     │Discounted│     │ Document │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                              │
//! │                   add_to_cart      set_custom_price     commit_sale     │
//! │                   update_item      set_discount         commit_quotation│
//! │                   remove_item      set_tax_rate         (checkout.rs)   │
//! │                        │           select_price_list                    │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────►                   │
//! │                                                      (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tienda_core::input::parse_optional_amount;
use tienda_core::{
    compute_totals, Cart, CartLine, CoreError, Money, OverrideChange, PriceLists, QuantityChange,
    Totals,
};

use crate::error::ApiError;
use crate::state::{CartState, CatalogState};

/// One cart line as the client displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    /// List price under the selected price list.
    pub list_price: Money,
    /// Lowest custom price the line accepts.
    pub min_price: Money,
    /// Unit price charged: custom price or list price.
    pub effective_price: Money,
    pub line_total: Money,
    pub has_override: bool,
    pub stock_on_hand: Option<i64>,
}

impl CartItemView {
    fn build(cart: &Cart, line: &CartLine, price_lists: &PriceLists) -> Result<Self, CoreError> {
        let entry = cart.resolved_entry(line, price_lists);
        let effective_price = cart.effective_price(line, price_lists);
        let line_total = effective_price
            .checked_mul_quantity(line.quantity)
            .ok_or(CoreError::AmountOverflow)?;

        Ok(CartItemView {
            product_id: line.product.id.clone(),
            sku: line.product.sku.clone(),
            name: line.product.name.clone(),
            quantity: line.quantity,
            list_price: entry.list_price,
            min_price: entry.min_price(),
            effective_price,
            line_total,
            has_override: cart.custom_price(line.product_id()).is_some(),
            stock_on_hand: line.product.stock_on_hand,
        })
    }
}

/// Cart response including items and totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItemView>,
    pub totals: Totals,
    pub item_count: usize,
    pub total_quantity: i64,
    /// `None` while the default list is in effect.
    pub price_list_id: Option<String>,
    /// Tax-rate field as typed.
    pub tax_rate: String,
    /// Discount field as typed.
    pub discount: String,
    pub client_id: Option<String>,

    /// Set when a quantity edit was clamped to stock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_change: Option<QuantityChange>,

    /// Lines whose custom price was dropped by a price-list switch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_overrides: Vec<String>,
}

impl CartResponse {
    /// Builds the view with fresh totals.
    ///
    /// Fails only when the cart's amounts leave the cents range.
    pub fn build(cart: &Cart, price_lists: &PriceLists) -> Result<Self, ApiError> {
        Ok(CartResponse {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView::build(cart, line, price_lists))
                .collect::<Result<_, _>>()?,
            totals: compute_totals(cart, price_lists)?,
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            price_list_id: cart.price_list_id().map(str::to_string),
            tax_rate: cart.tax_rate_input().to_string(),
            discount: cart.discount_input().to_string(),
            client_id: cart.client_id().map(str::to_string),
            quantity_change: None,
            dropped_overrides: Vec::new(),
        })
    }
}

/// Gets the current cart contents.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  CART                                     Price list: Wholesale         │
/// ├─────────────────────────────────────────────────────────────────────────┤
/// │  Coca-Cola 330ml     x2     1.69  (custom 1.50)            3.00         │
/// │  Chips Classic       x1     2.49                           2.49         │
/// ├─────────────────────────────────────────────────────────────────────────┤
/// │  Subtotal                                                  5.49         │
/// │  Tax (16%)                                                 1.05         │
/// │  Discount (max 0.42)                                      -0.40         │
/// │  ────────────────────────────────────────────────────                  │
/// │  TOTAL                                                     6.14         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn get_cart(catalog: &CatalogState, cart: &CartState) -> Result<CartResponse, ApiError> {
    debug!("get_cart command");
    cart.with_cart(|c| CartResponse::build(c, catalog.price_lists()))
}

/// Adds one unit of a product to the cart.
///
/// ## Behavior
/// - Product already in cart: quantity increases by one
/// - Otherwise: added as a new line
///
/// ## Errors
/// - `NOT_FOUND` if the product is not in the catalog
/// - `UNPRICED` if neither the selected nor the default list prices it
/// - `INSUFFICIENT_STOCK` on a sales terminal with no stock left
pub fn add_to_cart(
    catalog: &CatalogState,
    cart: &CartState,
    product_id: String,
) -> Result<CartResponse, ApiError> {
    debug!(product_id = %product_id, "add_to_cart command");

    let product = catalog.find_product(&product_id)?;
    let price_lists = catalog.price_lists();

    cart.with_cart_mut(|c| {
        c.add(product, price_lists)?;
        CartResponse::build(c, price_lists)
    })
}

/// Updates the quantity of an item in the cart.
///
/// ## Behavior
/// - Quantity ≤ 0: removes the item and its custom price
/// - Sales terminal: quantity above stock is clamped, reported in
///   `quantityChange`
pub fn update_cart_item(
    catalog: &CatalogState,
    cart: &CartState,
    product_id: String,
    quantity: i64,
) -> Result<CartResponse, ApiError> {
    debug!(product_id = %product_id, quantity = %quantity, "update_cart_item command");

    cart.with_cart_mut(|c| {
        let change = c.set_quantity(&product_id, quantity)?;
        if let QuantityChange::Clamped { requested, applied } = change {
            info!(product_id = %product_id, requested, applied, "Quantity clamped to stock");
        }

        let mut response = CartResponse::build(c, catalog.price_lists())?;
        response.quantity_change = Some(change);
        Ok::<_, ApiError>(response)
    })
}

/// Removes an item from the cart. Removing an absent item is a no-op.
pub fn remove_from_cart(
    catalog: &CatalogState,
    cart: &CartState,
    product_id: String,
) -> Result<CartResponse, ApiError> {
    debug!(product_id = %product_id, "remove_from_cart command");

    cart.with_cart_mut(|c| {
        c.remove(&product_id);
        CartResponse::build(c, catalog.price_lists())
    })
}

/// Clears the cart.
///
/// ## When Used
/// - Operator cancels the sale
/// - After a commit (new transaction)
pub fn clear_cart(catalog: &CatalogState, cart: &CartState) -> Result<CartResponse, ApiError> {
    debug!("clear_cart command");

    cart.with_cart_mut(|c| {
        c.clear();
        CartResponse::build(c, catalog.price_lists())
    })
}

/// Sets a manual unit price for a line.
///
/// ## Arguments
/// * `price` - Price as typed; blank or the list price removes the
///   custom price
///
/// ## Errors
/// - `PRICE_OUT_OF_RANGE` below the minimum margin or above list price
/// - `VALIDATION_ERROR` when the text is not a number
pub fn set_custom_price(
    catalog: &CatalogState,
    cart: &CartState,
    product_id: String,
    price: String,
) -> Result<CartResponse, ApiError> {
    debug!(product_id = %product_id, price = %price, "set_custom_price command");

    let price_lists = catalog.price_lists();
    cart.with_cart_mut(|c| {
        if price.trim().is_empty() {
            if c.line(&product_id).is_none() {
                return Err(ApiError::not_found("Cart line", &product_id));
            }
            c.reset_custom_price(&product_id);
        } else if let OverrideChange::Set(new_price) =
            c.set_custom_price_input(&product_id, &price, price_lists)?
        {
            debug!(product_id = %product_id, new_price = %new_price, "Custom price set");
        }

        CartResponse::build(c, price_lists)
    })
}

/// Stores the tax-rate field.
///
/// Any text is accepted: outside `(0, 100)` percent it simply means no tax.
pub fn set_tax_rate(
    catalog: &CatalogState,
    cart: &CartState,
    tax_rate: String,
) -> Result<CartResponse, ApiError> {
    debug!(tax_rate = %tax_rate, "set_tax_rate command");

    cart.with_cart_mut(|c| {
        c.set_tax_rate_input(tax_rate);
        CartResponse::build(c, catalog.price_lists())
    })
}

/// Stores the requested global discount.
///
/// The amount is accepted as requested and clamped to the margin budget in
/// the totals (`totals.globalDiscount`). Blank clears it.
///
/// ## Errors
/// - `VALIDATION_ERROR` for text that is not a non-negative amount
pub fn set_discount(
    catalog: &CatalogState,
    cart: &CartState,
    discount: String,
) -> Result<CartResponse, ApiError> {
    debug!(discount = %discount, "set_discount command");

    let amount = parse_optional_amount("discount", &discount)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    cart.with_cart_mut(|c| {
        c.set_discount_input(amount.map(|a| a.to_string()).unwrap_or_default());
        CartResponse::build(c, catalog.price_lists())
    })
}

/// Switches the price list (`None` = default list).
///
/// Custom prices that no longer fit the new list's envelope are dropped and
/// listed in `droppedOverrides`.
pub fn select_price_list(
    catalog: &CatalogState,
    cart: &CartState,
    price_list_id: Option<String>,
) -> Result<CartResponse, ApiError> {
    debug!(price_list_id = ?price_list_id, "select_price_list command");

    let price_lists = catalog.price_lists();
    cart.with_cart_mut(|c| {
        let dropped = c.select_price_list(price_list_id.as_deref(), price_lists)?;
        if !dropped.is_empty() {
            info!(dropped = ?dropped, "Custom prices dropped by price list switch");
        }

        let mut response = CartResponse::build(c, price_lists)?;
        response.dropped_overrides = dropped;
        Ok::<_, ApiError>(response)
    })
}

/// Attaches a client to the cart (`None` detaches).
pub fn select_client(
    catalog: &CatalogState,
    cart: &CartState,
    client_id: Option<String>,
) -> Result<CartResponse, ApiError> {
    debug!(client_id = ?client_id, "select_client command");

    cart.with_cart_mut(|c| {
        c.select_client(client_id);
        CartResponse::build(c, catalog.price_lists())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::setup;
    use crate::error::ErrorCode;
    use crate::state::TerminalMode;

    #[test]
    fn test_add_and_view_cart() {
        let (catalog, cart) = setup(TerminalMode::Sales);

        add_to_cart(&catalog, &cart, "a".into()).unwrap();
        let response = add_to_cart(&catalog, &cart, "a".into()).unwrap();

        assert_eq!(response.item_count, 1);
        assert_eq!(response.total_quantity, 2);
        let item = &response.items[0];
        assert_eq!(item.list_price, Money::from_units(100));
        assert_eq!(item.min_price, Money::from_units(80));
        assert_eq!(item.line_total, Money::from_units(200));
        assert!(!item.has_override);
        assert_eq!(response.totals.total_margin, Money::from_units(40));

        assert_eq!(get_cart(&catalog, &cart).unwrap(), response);
    }

    #[test]
    fn test_add_unknown_and_unpriced_products() {
        let (catalog, cart) = setup(TerminalMode::Sales);

        let err = add_to_cart(&catalog, &cart, "zzz".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = add_to_cart(&catalog, &cart, "ghost".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unpriced);
        assert_eq!(get_cart(&catalog, &cart).unwrap().item_count, 0);
    }

    #[test]
    fn test_sales_terminal_enforces_stock() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        for _ in 0..3 {
            add_to_cart(&catalog, &cart, "a".into()).unwrap();
        }

        let err = add_to_cart(&catalog, &cart, "a".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let response = update_cart_item(&catalog, &cart, "a".into(), 10).unwrap();
        assert_eq!(response.total_quantity, 3);
        assert_eq!(
            response.quantity_change,
            Some(QuantityChange::Clamped {
                requested: 10,
                applied: 3
            })
        );
    }

    #[test]
    fn test_quotation_builder_ignores_stock() {
        let (catalog, cart) = setup(TerminalMode::Quotation);
        add_to_cart(&catalog, &cart, "a".into()).unwrap();

        let response = update_cart_item(&catalog, &cart, "a".into(), 50).unwrap();
        assert_eq!(response.total_quantity, 50);
        assert_eq!(
            response.quantity_change,
            Some(QuantityChange::Updated { quantity: 50 })
        );
    }

    #[test]
    fn test_oversized_quantity_is_a_validation_error() {
        let (catalog, cart) = setup(TerminalMode::Quotation);
        add_to_cart(&catalog, &cart, "a".into()).unwrap();

        let err = update_cart_item(&catalog, &cart, "a".into(), 1_000_000_000_000_000).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("quantity must be between 1 and 999"));

        let response = get_cart(&catalog, &cart).unwrap();
        assert_eq!(response.total_quantity, 1);
        assert_eq!(response.totals.subtotal, Money::from_units(100));
    }

    #[test]
    fn test_zero_quantity_removes_line_and_override() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        add_to_cart(&catalog, &cart, "a".into()).unwrap();
        set_custom_price(&catalog, &cart, "a".into(), "90".into()).unwrap();

        let response = update_cart_item(&catalog, &cart, "a".into(), 0).unwrap();
        assert!(response.items.is_empty());
        assert!(cart.with_cart(|c| c.overrides().is_empty()));

        // Removing again is a no-op
        let response = remove_from_cart(&catalog, &cart, "a".into()).unwrap();
        assert!(response.items.is_empty());
    }

    #[test]
    fn test_custom_price_bounds_and_reset() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        add_to_cart(&catalog, &cart, "a".into()).unwrap();

        let err = set_custom_price(&catalog, &cart, "a".into(), "79.99".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::PriceOutOfRange);
        let err = set_custom_price(&catalog, &cart, "a".into(), "100.01".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::PriceOutOfRange);
        let err = set_custom_price(&catalog, &cart, "a".into(), "cheap".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let response = set_custom_price(&catalog, &cart, "a".into(), "85".into()).unwrap();
        assert!(response.items[0].has_override);
        assert_eq!(response.items[0].effective_price, Money::from_units(85));
        assert_eq!(response.totals.implicit_discount, Money::from_units(15));

        // Typing the list price removes the override
        let response = set_custom_price(&catalog, &cart, "a".into(), "100".into()).unwrap();
        assert!(!response.items[0].has_override);

        set_custom_price(&catalog, &cart, "a".into(), "85".into()).unwrap();
        let response = set_custom_price(&catalog, &cart, "a".into(), "".into()).unwrap();
        assert!(!response.items[0].has_override);

        let err = set_custom_price(&catalog, &cart, "b".into(), "".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_discount_is_clamped_to_margin() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        add_to_cart(&catalog, &cart, "a".into()).unwrap();
        add_to_cart(&catalog, &cart, "a".into()).unwrap();
        set_custom_price(&catalog, &cart, "a".into(), "80".into()).unwrap();

        let response = set_discount(&catalog, &cart, "25".into()).unwrap();
        assert_eq!(response.discount, "25.00");
        assert_eq!(response.totals.max_global_discount, Money::ZERO);
        assert_eq!(response.totals.global_discount, Money::ZERO);
        assert_eq!(response.totals.final_total, Money::from_units(160));

        let err = set_discount(&catalog, &cart, "-5".into()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let response = set_discount(&catalog, &cart, " ".into()).unwrap();
        assert_eq!(response.discount, "");
    }

    #[test]
    fn test_any_tax_rate_text_is_accepted() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        add_to_cart(&catalog, &cart, "b".into()).unwrap();

        let response = set_tax_rate(&catalog, &cart, "20".into()).unwrap();
        assert_eq!(response.totals.tax_amount, Money::from_cents(1_250));

        let response = set_tax_rate(&catalog, &cart, "150".into()).unwrap();
        assert_eq!(response.tax_rate, "150");
        assert_eq!(response.totals.tax_amount, Money::ZERO);
    }

    #[test]
    fn test_price_list_switch_drops_stale_override() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        add_to_cart(&catalog, &cart, "a".into()).unwrap();
        set_custom_price(&catalog, &cart, "a".into(), "82".into()).unwrap();

        // wholesale: list 90, min price 75.00 → 82 still fits
        let response = select_price_list(&catalog, &cart, Some("wholesale".into())).unwrap();
        assert!(response.dropped_overrides.is_empty());
        assert_eq!(response.items[0].list_price, Money::from_units(90));
        assert_eq!(response.items[0].effective_price, Money::from_units(82));

        set_custom_price(&catalog, &cart, "a".into(), "76".into()).unwrap();
        let response = select_price_list(&catalog, &cart, None).unwrap();
        assert_eq!(response.dropped_overrides, vec!["a".to_string()]);
        assert_eq!(response.items[0].effective_price, Money::from_units(100));

        let err = select_price_list(&catalog, &cart, Some("vip".into())).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_clear_resets_cart_fields() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        add_to_cart(&catalog, &cart, "b".into()).unwrap();
        set_discount(&catalog, &cart, "1".into()).unwrap();
        select_client(&catalog, &cart, Some("c-1".into())).unwrap();

        let response = clear_cart(&catalog, &cart).unwrap();
        assert!(response.items.is_empty());
        assert_eq!(response.discount, "");
        assert_eq!(response.client_id, None);
        assert_eq!(response.totals, Totals::default());
    }

    #[test]
    fn test_response_json_shape() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        let response = add_to_cart(&catalog, &cart, "a".into()).unwrap();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["items"][0]["effectivePrice"], 10_000);
        assert_eq!(json["items"][0]["hasOverride"], false);
        assert_eq!(json["totals"]["maxGlobalDiscount"], 2_000);
        assert!(json.get("quantityChange").is_none());
        assert!(json.get("droppedOverrides").is_none());
    }
}
