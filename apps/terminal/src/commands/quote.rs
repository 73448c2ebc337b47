//! # Quote Replay
//!
//! Rebuilds a cart from a declarative request and prices it. Backs the
//! `tienda-quote` binary and lets clients price a cart in one call.
//!
//! ## Request Format
//! ```json
//! {
//!   "priceListId": "wholesale",
//!   "taxRate": "16",
//!   "discount": "10",
//!   "clientId": "client-42",
//!   "lines": [
//!     { "productId": "p-1", "quantity": 3, "customPrice": "1.50" },
//!     { "productId": "p-2" }
//!   ]
//! }
//! ```
//!
//! Steps run in the order an operator would perform them: price list,
//! lines, custom prices, tax rate, discount, client. The first failing step
//! aborts the replay.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cart::{
    add_to_cart, get_cart, select_client, select_price_list, set_custom_price, set_discount,
    set_tax_rate, update_cart_item, CartResponse,
};
use crate::error::ApiError;
use crate::state::{CartState, CatalogState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub price_list_id: Option<String>,
    #[serde(default)]
    pub tax_rate: Option<String>,
    #[serde(default)]
    pub discount: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub lines: Vec<QuoteLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub custom_price: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

/// Applies `request` to `cart` and returns the resulting cart view.
pub fn replay_quote(
    catalog: &CatalogState,
    cart: &CartState,
    request: &QuoteRequest,
) -> Result<CartResponse, ApiError> {
    debug!(lines = request.lines.len(), "replay_quote command");

    if request.price_list_id.is_some() {
        select_price_list(catalog, cart, request.price_list_id.clone())?;
    }

    for line in &request.lines {
        add_to_cart(catalog, cart, line.product_id.clone())?;
        if line.quantity != 1 {
            update_cart_item(catalog, cart, line.product_id.clone(), line.quantity)?;
        }
    }

    for line in &request.lines {
        if let Some(price) = &line.custom_price {
            set_custom_price(catalog, cart, line.product_id.clone(), price.clone())?;
        }
    }

    if let Some(tax_rate) = &request.tax_rate {
        set_tax_rate(catalog, cart, tax_rate.clone())?;
    }
    if let Some(discount) = &request.discount {
        set_discount(catalog, cart, discount.clone())?;
    }
    if request.client_id.is_some() {
        select_client(catalog, cart, request.client_id.clone())?;
    }

    get_cart(catalog, cart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::setup;
    use crate::error::ErrorCode;
    use crate::state::TerminalMode;
    use tienda_core::Money;

    #[test]
    fn test_replay_full_request() {
        let (catalog, cart) = setup(TerminalMode::Quotation);
        let request: QuoteRequest = serde_json::from_str(
            r#"{
                "priceListId": "wholesale",
                "taxRate": "20",
                "discount": "1000",
                "clientId": "client-42",
                "lines": [
                    { "productId": "a", "quantity": 2, "customPrice": "80" },
                    { "productId": "b" }
                ]
            }"#,
        )
        .unwrap();

        let response = replay_quote(&catalog, &cart, &request).unwrap();

        assert_eq!(response.price_list_id.as_deref(), Some("wholesale"));
        assert_eq!(response.total_quantity, 3);
        assert_eq!(response.client_id.as_deref(), Some("client-42"));

        // a: wholesale 90 (margin 15 each), custom 80 → implicit 20 of 30
        // b: default list 50, no margin
        let totals = response.totals;
        assert_eq!(totals.subtotal, Money::from_units(210));
        assert_eq!(totals.total_margin, Money::from_units(30));
        assert_eq!(totals.implicit_discount, Money::from_units(20));
        assert_eq!(totals.global_discount, Money::from_units(10));
        assert_eq!(totals.tax_amount, Money::from_cents(5_250));
        assert_eq!(totals.final_total, Money::from_cents(25_250));
    }

    #[test]
    fn test_replay_stops_at_first_error() {
        let (catalog, cart) = setup(TerminalMode::Quotation);
        let request = QuoteRequest {
            lines: vec![
                QuoteLine {
                    product_id: "b".to_string(),
                    quantity: 1,
                    custom_price: None,
                },
                QuoteLine {
                    product_id: "ghost".to_string(),
                    quantity: 1,
                    custom_price: None,
                },
            ],
            ..QuoteRequest::default()
        };

        let err = replay_quote(&catalog, &cart, &request).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unpriced);
    }

    #[test]
    fn test_replay_rejects_oversized_quantity() {
        let (catalog, cart) = setup(TerminalMode::Quotation);
        let request: QuoteRequest = serde_json::from_str(
            r#"{ "lines": [ { "productId": "a", "quantity": 1000000000000000 } ] }"#,
        )
        .unwrap();

        let err = replay_quote(&catalog, &cart, &request).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
