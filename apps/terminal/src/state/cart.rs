//! # Cart State
//!
//! Holds the session's cart behind a mutex.
//!
//! ## Thread Safety
//! The cart is wrapped in `Arc<Mutex<T>>` because:
//! 1. Multiple commands may access/modify the cart
//! 2. Only one command should modify the cart at a time
//! 3. Commit commands run concurrently with cart edits
//!
//! Every command runs one closure under the lock, so each cart operation
//! (a line edit, an override write, a price-list switch with its override
//! cleanup) is applied as a whole before the next totals computation.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Operator Action          Command                 Cart Change           │
//! │  ───────────────          ───────                 ───────────           │
//! │                                                                         │
//! │  Scan Product ───────────► add_to_cart() ───────► Cart::add             │
//! │                                                                         │
//! │  Change Quantity ────────► update_cart_item() ──► Cart::set_quantity    │
//! │                                                                         │
//! │  Type Unit Price ────────► set_custom_price() ──► override map write    │
//! │                                                                         │
//! │  Pick Price List ────────► select_price_list() ─► list + override prune │
//! │                                                                         │
//! │  Click Clear ────────────► clear_cart() ────────► Cart::clear           │
//! │                                                                         │
//! │  View Cart ──────────────► get_cart() ──────────► (read only)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tienda_core::Cart;

use super::ConfigState;

/// Session-managed cart state.
///
/// ## Why Not RwLock?
/// Cart operations are quick, and most operations modify state.
#[derive(Debug, Clone)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new(cart: Cart) -> Self {
        CartState {
            cart: Arc::new(Mutex::new(cart)),
        }
    }

    /// Empty cart with the terminal's stock policy and default tax rate.
    pub fn for_config(config: &ConfigState) -> Self {
        CartState::new(
            Cart::new(config.stock_policy()).with_default_tax_rate(config.default_tax_rate.clone()),
        )
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|cart| compute_totals(cart, lists));
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.lock();
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add(&product, lists))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.lock();
        f(&mut cart)
    }

    // A panic inside a closure leaves the cart as the last completed
    // mutation wrote it; every Cart method validates before writing.
    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CartState {
    fn default() -> Self {
        CartState::new(Cart::default())
    }
}
