//! # Error Types
//!
//! Domain-specific error types for tienda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tienda-core errors (this file)                                        │
//! │  ├── CoreError        - Cart / catalog rule violations                 │
//! │  ├── PricingError     - Custom price outside the margin envelope       │
//! │  └── ValidationError  - Unusable free-text input                       │
//! │                                                                         │
//! │  tienda-terminal errors (app)                                          │
//! │  └── ApiError         - What the client sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError / PricingError → CoreError → ApiError → Client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error here is recoverable: the cart is left exactly as it was
//! before the rejected operation.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Cart and catalog rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product id is not in the catalog snapshot.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product is flagged inactive in the catalog.
    #[error("Product {0} is not available for sale")]
    ProductInactive(String),

    /// Operation targets a product that has no cart line.
    #[error("Product {0} is not in the cart")]
    LineNotFound(String),

    /// Neither the active list nor the default list prices the product.
    ///
    /// This is a business state, not a fault: the product simply cannot be
    /// sold until someone prices it.
    #[error("Product {product_id} has no price in the selected or default price list")]
    Unpriced { product_id: String },

    /// Requested quantity exceeds stock on hand (sales terminal only).
    ///
    /// ## User Workflow
    /// ```text
    /// Add to cart (qty in cart: 3)
    ///      │
    ///      ▼
    /// stock_on_hand = 3
    ///      │
    ///      ▼
    /// StockExceeded { available: 3, requested: 4 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 in stock"
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    StockExceeded {
        product_id: String,
        available: i64,
        requested: i64,
    },

    #[error("Price list not found: {0}")]
    UnknownPriceList(String),

    #[error("No price list is flagged as default")]
    NoDefaultPriceList,

    #[error("More than one price list is flagged as default: {ids:?}")]
    MultipleDefaultPriceLists { ids: Vec<String> },

    /// Checkout requested on a cart without lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A line total, margin or tax left the representable cents range.
    ///
    /// Only reachable with catalog amounts or quantities far outside
    /// [`MAX_PRICE_CENTS`](crate::MAX_PRICE_CENTS) and
    /// [`MAX_ITEM_QUANTITY`](crate::MAX_ITEM_QUANTITY).
    #[error("Cart amounts exceed the supported range")]
    AmountOverflow,

    /// Checkout found a cart that breaks one of its invariants.
    #[error("Cart cannot be committed: {reason}")]
    InvalidCart { reason: String },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Pricing Error
// =============================================================================

/// Reasons a manual unit price is refused.
///
/// The bound that was violated is carried so the client can display it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Not a usable non-negative amount.
    #[error("'{input}' is not a valid price")]
    InvalidNumber { input: String },

    /// Price would cut into the minimum margin.
    #[error("Price cannot be lower than {min_price}")]
    BelowMinimumMargin { min_price: Money },

    /// Custom prices may only discount, never mark up.
    #[error("Price cannot be higher than the list price {list_price}")]
    AboveListPrice { list_price: Money },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Free-text numeric input that is not a usable non-negative number.
    #[error("{field} has invalid number '{input}'")]
    InvalidNumber { field: String, input: String },

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value outside the allowed range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Duplicate value (e.g., duplicate price list id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::StockExceeded {
            product_id: "p1".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for p1: available 3, requested 5"
        );

        let err = PricingError::BelowMinimumMargin {
            min_price: Money::from_cents(8_000),
        };
        assert_eq!(err.to_string(), "Price cannot be lower than 80.00");
    }

    #[test]
    fn test_pricing_error_is_transparent_in_core_error() {
        let err: CoreError = PricingError::AboveListPrice {
            list_price: Money::from_cents(10_000),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Price cannot be higher than the list price 100.00"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::InvalidNumber {
            field: "discount".to_string(),
            input: "abc".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(
            core_err.to_string(),
            "Validation error: discount has invalid number 'abc'"
        );
    }

    #[test]
    fn test_out_of_range_message() {
        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 999,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 999");
    }
}
