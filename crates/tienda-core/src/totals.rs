//! # Totals Calculation
//!
//! Reduces a cart snapshot, a tax rate and a requested global discount into
//! a consistent set of totals. Pure and idempotent: recomputed whenever the
//! cart, tax rate, discount or price list changes, never stored.
//!
//! All sums are checked. A cart whose amounts leave the `i64` cents range
//! yields `CoreError::AmountOverflow` instead of wrapped totals.
//!
//! ## Reduction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  effective_i      = custom_price_i ?? list_price_i                      │
//! │                                                                         │
//! │  1. subtotal      = Σ effective_i × qty_i                               │
//! │  2. tax           = subtotal / (1 − t) − subtotal     (0 < t < 100%)    │
//! │  3. implicit      = Σ (list_price_i − custom_price_i) × qty_i           │
//! │  4. total_margin  = Σ (max_margin_i − min_margin_i) × qty_i             │
//! │  5. max_global    = max(0, total_margin − implicit)                     │
//! │  6. global        = clamp(requested, 0, max_global)                     │
//! │  7. final         = max(0, subtotal + tax − global)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use tienda_core::money::Money;
//! use tienda_core::totals::{compute, PricedLine};
//! use tienda_core::types::{PriceEntry, TaxRate};
//!
//! let line = PricedLine {
//!     product_id: "p1".into(),
//!     quantity: 3,
//!     entry: PriceEntry::new(Money::from_units(50), Money::ZERO, Money::ZERO),
//!     custom_price: None,
//! };
//!
//! let totals = compute(&[line], TaxRate::from_bps(2_000), Money::ZERO).unwrap();
//! assert_eq!(totals.subtotal.cents(), 15_000);
//! assert_eq!(totals.tax_amount.cents(), 3_750);
//! assert_eq!(totals.final_total.cents(), 18_750);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::discount::MarginBudget;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PriceEntry, PriceLists, TaxRate};

/// A cart line with its price entry already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: String,
    pub quantity: i64,
    pub entry: PriceEntry,
    pub custom_price: Option<Money>,
}

impl PricedLine {
    #[inline]
    pub fn effective_price(&self) -> Money {
        self.custom_price.unwrap_or(self.entry.list_price)
    }

    #[inline]
    pub fn line_total(&self) -> CoreResult<Money> {
        self.effective_price()
            .checked_mul_quantity(self.quantity)
            .ok_or(CoreError::AmountOverflow)
    }
}

/// The derived totals of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Totals {
    /// Σ effective price × quantity.
    pub subtotal: Money,
    /// Tax grossed up on top of the subtotal.
    pub tax_amount: Money,
    /// Accepted global discount (requested amount clamped to the budget).
    pub global_discount: Money,
    /// Largest global discount the cart could absorb.
    pub max_global_discount: Money,
    /// Amount to charge. Never negative.
    pub final_total: Money,
    /// Margin already consumed by custom prices.
    pub implicit_discount: Money,
    /// Σ (max margin − min margin) × quantity.
    pub total_margin: Money,
}

/// Reduces already-resolved lines into totals.
///
/// ## Errors
/// `AmountOverflow` when any line total, sum or the tax leaves the cents
/// range.
pub fn compute(
    lines: &[PricedLine],
    tax_rate: TaxRate,
    requested_discount: Money,
) -> CoreResult<Totals> {
    let mut budget = MarginBudget::new();
    let mut subtotal = Money::ZERO;

    for line in lines {
        subtotal = subtotal
            .checked_add(line.line_total()?)
            .ok_or(CoreError::AmountOverflow)?;
        budget.add_line(&line.entry, line.custom_price, line.quantity)?;
    }

    let tax_amount = subtotal
        .gross_up_tax(tax_rate)
        .ok_or(CoreError::AmountOverflow)?;
    let global_discount = budget.allocate(requested_discount);
    let final_total = subtotal
        .checked_add(tax_amount)
        .and_then(|gross| gross.checked_sub(global_discount))
        .ok_or(CoreError::AmountOverflow)?
        .non_negative();

    Ok(Totals {
        subtotal,
        tax_amount,
        global_discount,
        max_global_discount: budget.remaining(),
        final_total,
        implicit_discount: budget.implicit(),
        total_margin: budget.available(),
    })
}

/// Computes the totals of `cart` under its selected price list, tax-rate
/// field and discount field.
pub fn compute_totals(cart: &Cart, price_lists: &PriceLists) -> CoreResult<Totals> {
    compute(
        &cart.priced_lines(price_lists),
        cart.tax_rate(),
        cart.requested_discount(),
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::StockPolicy;
    use crate::types::{PriceList, Product};
    use std::collections::BTreeMap;

    fn lists() -> PriceLists {
        PriceLists::new(vec![
            PriceList {
                id: "retail".to_string(),
                name: "Retail".to_string(),
                is_default: true,
            },
            PriceList {
                id: "promo".to_string(),
                name: "Promo".to_string(),
                is_default: false,
            },
        ])
        .unwrap()
    }

    fn product(id: &str, list: i64, max: i64, min: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            is_active: true,
            prices: BTreeMap::from([(
                "retail".to_string(),
                PriceEntry::new(
                    Money::from_units(list),
                    Money::from_units(max),
                    Money::from_units(min),
                ),
            )]),
            stock_on_hand: None,
        }
    }

    fn cart_with(products: &[(&Product, i64)]) -> Cart {
        let mut cart = Cart::new(StockPolicy::Unlimited);
        for (product, qty) in products {
            cart.add(product, &lists()).unwrap();
            cart.set_quantity(&product.id, *qty).unwrap();
        }
        cart
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let mut cart = Cart::default();
        cart.set_tax_rate_input("20");
        cart.set_discount_input("50");

        let totals = compute_totals(&cart, &lists()).unwrap();
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_tax_gross_up_example() {
        let p = product("1", 50, 0, 0);
        let mut cart = cart_with(&[(&p, 3)]);
        cart.set_tax_rate_input("20");

        let totals = compute_totals(&cart, &lists()).unwrap();
        assert_eq!(totals.subtotal, Money::from_units(150));
        assert_eq!(totals.tax_amount, Money::from_cents(3_750));
        assert_eq!(totals.final_total, Money::from_cents(18_750));
    }

    #[test]
    fn test_degenerate_tax_rate_is_neutralized() {
        let p = product("1", 50, 0, 0);
        let mut cart = cart_with(&[(&p, 3)]);

        for rate in ["150", "100", "-5", "abc", ""] {
            cart.set_tax_rate_input(rate);
            let totals = compute_totals(&cart, &lists()).unwrap();
            assert_eq!(totals.tax_amount, Money::ZERO, "rate {rate:?}");
            assert_eq!(totals.final_total, Money::from_units(150));
        }
    }

    #[test]
    fn test_custom_price_exhausts_global_discount_budget() {
        // list 100, max 30, min 10, qty 2 → margin 40
        let p = product("1", 100, 30, 10);
        let mut cart = cart_with(&[(&p, 2)]);
        assert_eq!(
            compute_totals(&cart, &lists()).unwrap().total_margin,
            Money::from_units(40)
        );

        cart.set_custom_price("1", Money::from_units(80), &lists()).unwrap();
        cart.set_discount_input("25");

        let totals = compute_totals(&cart, &lists()).unwrap();
        assert_eq!(totals.implicit_discount, Money::from_units(40));
        assert_eq!(totals.max_global_discount, Money::ZERO);
        assert_eq!(totals.global_discount, Money::ZERO);
        assert_eq!(totals.subtotal, Money::from_units(160));
        assert_eq!(totals.final_total, Money::from_units(160));
    }

    #[test]
    fn test_global_discount_clamped_to_remaining_margin() {
        let a = product("a", 100, 30, 10);
        let b = product("b", 40, 10, 0);
        let mut cart = cart_with(&[(&a, 1), (&b, 2)]);
        cart.set_custom_price("a", Money::from_units(90), &lists()).unwrap();

        // margin = 20 + 20 = 40, implicit = 10 → 30 left
        cart.set_discount_input("1000");
        let totals = compute_totals(&cart, &lists()).unwrap();
        assert_eq!(totals.max_global_discount, Money::from_units(30));
        assert_eq!(totals.global_discount, Money::from_units(30));
        assert_eq!(totals.subtotal, Money::from_units(170));
        assert_eq!(totals.final_total, Money::from_units(140));

        cart.set_discount_input("12.5");
        let totals = compute_totals(&cart, &lists()).unwrap();
        assert_eq!(totals.global_discount, Money::from_cents(1_250));
        assert_eq!(totals.final_total, Money::from_cents(15_750));
    }

    #[test]
    fn test_discount_applies_after_tax() {
        let p = product("1", 100, 30, 0);
        let mut cart = cart_with(&[(&p, 1)]);
        cart.set_tax_rate_input("20");
        cart.set_discount_input("10");

        let totals = compute_totals(&cart, &lists()).unwrap();
        assert_eq!(totals.tax_amount, Money::from_units(25));
        assert_eq!(totals.final_total, Money::from_units(115));
    }

    #[test]
    fn test_negative_discount_input_counts_as_zero() {
        let p = product("1", 100, 30, 0);
        let mut cart = cart_with(&[(&p, 1)]);
        cart.set_discount_input("-40");

        let totals = compute_totals(&cart, &lists()).unwrap();
        assert_eq!(totals.global_discount, Money::ZERO);
        assert_eq!(totals.final_total, Money::from_units(100));
    }

    #[test]
    fn test_oversized_line_is_an_error_not_a_wrap() {
        let line = PricedLine {
            product_id: "p".to_string(),
            quantity: 1_000_000_000_000_000,
            entry: PriceEntry::new(
                Money::from_units(100),
                Money::from_units(30),
                Money::from_units(10),
            ),
            custom_price: None,
        };
        assert_eq!(line.line_total(), Err(CoreError::AmountOverflow));
        assert_eq!(
            compute(&[line], TaxRate::zero(), Money::ZERO),
            Err(CoreError::AmountOverflow)
        );
    }

    #[test]
    fn test_tax_overflow_is_an_error() {
        let line = PricedLine {
            product_id: "p".to_string(),
            quantity: 1,
            entry: PriceEntry::new(Money::from_cents(i64::MAX / 100), Money::ZERO, Money::ZERO),
            custom_price: None,
        };
        assert!(compute(&[line.clone()], TaxRate::zero(), Money::ZERO).is_ok());
        assert_eq!(
            compute(&[line], TaxRate::from_bps(9_999), Money::ZERO),
            Err(CoreError::AmountOverflow)
        );
    }

    #[test]
    fn test_totals_are_idempotent() {
        let p = product("1", 100, 30, 10);
        let mut cart = cart_with(&[(&p, 4)]);
        cart.set_tax_rate_input("21");
        cart.set_discount_input("15");

        assert_eq!(
            compute_totals(&cart, &lists()).unwrap(),
            compute_totals(&cart, &lists()).unwrap()
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        /// (list, max margin, min margin, quantity, custom-price fraction)
        fn line_strategy() -> impl Strategy<Value = (i64, i64, i64, i64, Option<u8>)> {
            (1i64..100_000, 0i64..=100, 0i64..=100, 1i64..50, proptest::option::of(0u8..=100))
                .prop_map(|(list, max_pct, min_pct, qty, custom)| {
                    let max = list * max_pct / 100;
                    let min = max * min_pct / 100;
                    (list, max, min, qty, custom)
                })
        }

        fn priced_lines(specs: &[(i64, i64, i64, i64, Option<u8>)]) -> Vec<PricedLine> {
            specs
                .iter()
                .enumerate()
                .map(|(i, &(list, max, min, qty, custom))| {
                    let entry = PriceEntry::new(
                        Money::from_cents(list),
                        Money::from_cents(max),
                        Money::from_cents(min),
                    );
                    // Custom prices are always inside [min_price, list_price]
                    let custom_price = custom.map(|pct| {
                        let span = entry.list_price - entry.min_price();
                        entry.min_price() + Money::from_cents(span.cents() * pct as i64 / 100)
                    });
                    PricedLine {
                        product_id: format!("p{i}"),
                        quantity: qty,
                        entry,
                        custom_price,
                    }
                })
                .collect()
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: totals stay consistent for any tax or discount input.
            #[test]
            fn totals_respect_margin_budget(
                specs in proptest::collection::vec(line_strategy(), 0..8),
                tax_bps in 0u32..20_000,
                requested in -1_000_000i64..10_000_000,
            ) {
                let lines = priced_lines(&specs);
                let totals =
                    compute(&lines, TaxRate::from_bps(tax_bps), Money::from_cents(requested)).unwrap();

                prop_assert!(!totals.final_total.is_negative());
                prop_assert!(!totals.max_global_discount.is_negative());
                prop_assert!(!totals.global_discount.is_negative());
                prop_assert!(totals.global_discount <= totals.max_global_discount);
                prop_assert!(totals.implicit_discount + totals.global_discount <= totals.total_margin);
                prop_assert!(!totals.tax_amount.is_negative());
                if tax_bps >= TaxRate::FULL_BPS {
                    prop_assert_eq!(totals.tax_amount, Money::ZERO);
                }
            }

        }
    }
}
