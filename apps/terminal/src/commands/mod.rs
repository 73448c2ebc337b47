//! # Commands Module
//!
//! All commands exposed to terminal clients.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── cart.rs      ◄─── Cart manipulation, prices, tax, discount
//! ├── checkout.rs  ◄─── Commit as sale or quotation
//! └── quote.rs     ◄─── Declarative cart replay
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs the cart and the catalog
//! fn add_to_cart(catalog: &CatalogState, cart: &CartState, product_id: String)
//!
//! // Also needs the terminal config and the backend
//! async fn commit_sale(gateway: &G, config: &ConfigState, catalog: &CatalogState, cart: &CartState)
//! ```

pub mod cart;
pub mod checkout;
pub mod quote;
