//! # tienda-core: Pricing and Discount Engine
//!
//! Pure cart pricing for the sales terminal and the quotation builder:
//! price-list resolution, custom-price validation, the cart ledger, totals
//! and margin-bounded discount allocation. No I/O lives here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tienda Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              tienda-terminal (session + commands)               │   │
//! │  │    add_to_cart, set_custom_price, set_discount, commit_sale     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tienda-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌──────────────┐  ┌──────────┐  ┌──────────┐  │   │
//! │  │   │  pricing  │  │ custom_price │  │   cart   │  │  totals  │  │   │
//! │  │   │ fallback  │  │   envelope   │  │  ledger  │  │ discount │  │   │
//! │  │   └───────────┘  └──────────────┘  └──────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Checkout                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                CommitGateway (remote document store)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog types (Product, PriceEntry, PriceLists, TaxRate)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`input`] - Free-text amount parsing for operator-typed fields
//! - [`pricing`] - Active list / default list / unpriced fallback
//! - [`custom_price`] - Manual unit-price validation
//! - [`cart`] - The cart aggregate and its mutations
//! - [`discount`] - Margin budget shared by custom prices and global discount
//! - [`totals`] - Subtotal, tax gross-up, discount and final total
//! - [`checkout`] - Verified cart snapshot for commit
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same cart + same catalog = same totals
//! 2. **Integer Money**: all monetary values are cents (i64)
//! 3. **Margin First**: every discount is paid for out of configured margin
//! 4. **Explicit Errors**: typed errors, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use tienda_core::{compute_totals, Cart, Money, PriceEntry, PriceList, PriceLists, Product};
//!
//! let lists = PriceLists::new(vec![PriceList {
//!     id: "retail".into(),
//!     name: "Retail".into(),
//!     is_default: true,
//! }]).unwrap();
//!
//! let product = Product {
//!     id: "p1".into(),
//!     sku: "P1".into(),
//!     name: "Thing".into(),
//!     is_active: true,
//!     prices: BTreeMap::from([(
//!         "retail".to_string(),
//!         PriceEntry::new(Money::from_units(100), Money::from_units(30), Money::from_units(10)),
//!     )]),
//!     stock_on_hand: None,
//! };
//!
//! let mut cart = Cart::default();
//! cart.add(&product, &lists).unwrap();
//! cart.set_custom_price("p1", Money::from_units(85), &lists).unwrap();
//! cart.set_discount_input("50");
//!
//! // margin 20, custom price spent 15 → only 5 left for the global discount
//! let totals = compute_totals(&cart, &lists).unwrap();
//! assert_eq!(totals.global_discount, Money::from_units(5));
//! assert_eq!(totals.final_total, Money::from_units(80));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod custom_price;
pub mod discount;
pub mod error;
pub mod input;
pub mod money;
pub mod pricing;
pub mod totals;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tienda_core::Money` instead of
// `use tienda_core::money::Money`

pub use cart::{Cart, CartLine, CustomPriceOverride, QuantityChange, StockPolicy};
pub use checkout::{Checkout, FinalizedLine};
pub use custom_price::{validate_custom_price, OverrideChange};
pub use discount::MarginBudget;
pub use error::{CoreError, CoreResult, PricingError, ValidationError};
pub use money::Money;
pub use pricing::resolve_price;
pub use totals::{compute_totals, PricedLine, Totals};
pub use types::*;

// =============================================================================
// Constants
// =============================================================================

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Catches typing slips (1000 instead of 10) and keeps every line total,
/// margin and tax computation far inside the `i64` cents range.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest amount a single price entry field may carry, in cents
/// (1,000,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;
