//! # Domain Types
//!
//! Catalog types consumed (read-only) by the pricing engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Catalog Types                                   │
//! │                                                                         │
//! │  ┌──────────────────────┐        ┌─────────────────────────────┐       │
//! │  │    PriceLists        │        │         Product             │       │
//! │  │  ──────────────────  │        │  ─────────────────────────  │       │
//! │  │  [PriceList]         │        │  id, sku, name              │       │
//! │  │  exactly one default │        │  stock_on_hand (optional)   │       │
//! │  └──────────┬───────────┘        │  prices: list id → entry ───┼──┐    │
//! │             │                    └─────────────────────────────┘  │    │
//! │             │ list id                                             │    │
//! │             └────────────────────────────┐                        │    │
//! │                                          ▼                        ▼    │
//! │                               ┌─────────────────────────────────────┐  │
//! │                               │            PriceEntry               │  │
//! │                               │  list_price, max_margin, min_margin │  │
//! │                               │  cost = list_price − max_margin     │  │
//! │                               └─────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 2000 bps = 20%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// 100% expressed in basis points.
    pub const FULL_BPS: u32 = 10_000;

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whether the tax gross-up is defined for this rate (`0 < rate < 100%`).
    ///
    /// Rates of 100% or more would produce infinite or negative tax and are
    /// treated as "no tax".
    #[inline]
    pub const fn is_grossable(&self) -> bool {
        self.0 > 0 && self.0 < Self::FULL_BPS
    }
}

// =============================================================================
// Price Entry
// =============================================================================

/// The price and margin envelope of one product in one price list.
///
/// ## Derived Values
/// ```text
///   0 ──────── cost ─────────── min_price ─────────── list_price
///              │◄─ min_margin ─►│◄──── available ────►│
///              │◄──────────────── max_margin ────────►│
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceEntry {
    /// Gross sale price configured for the list.
    pub list_price: Money,

    /// Profit built into `list_price` over cost. Zero means the list has no
    /// active pricing rule for the product.
    #[serde(default)]
    pub max_margin: Money,

    /// Profit floor a discounted price must never go below.
    #[serde(default)]
    pub min_margin: Money,
}

impl PriceEntry {
    /// The "no price anywhere" entry.
    pub const UNPRICED: PriceEntry = PriceEntry {
        list_price: Money::ZERO,
        max_margin: Money::ZERO,
        min_margin: Money::ZERO,
    };

    pub const fn new(list_price: Money, max_margin: Money, min_margin: Money) -> Self {
        PriceEntry {
            list_price,
            max_margin,
            min_margin,
        }
    }

    /// An entry carries an active pricing rule iff its max margin is positive.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.max_margin.is_positive()
    }

    /// All-zero entries mean the product cannot be sold.
    #[inline]
    pub fn is_unpriced(&self) -> bool {
        *self == PriceEntry::UNPRICED
    }

    /// Implied unit cost. Never stored, always derived.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        self.list_price - self.max_margin
    }

    /// Lowest unit price that keeps the minimum margin.
    #[inline]
    pub fn min_price(&self) -> Money {
        self.unit_cost() + self.min_margin
    }

    /// Per-unit margin that discounts may consume.
    #[inline]
    pub fn available_margin(&self) -> Money {
        self.max_margin - self.min_margin
    }

    /// Whether `price` lies inside `[min_price, list_price]`.
    #[inline]
    pub fn admits(&self, price: Money) -> bool {
        price >= self.min_price() && price <= self.list_price
    }
}

// =============================================================================
// Price Lists
// =============================================================================

/// A named set of per-product prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

/// The catalog's price lists, with exactly one flagged as default.
///
/// The invariant is checked once, on construction, so the resolver can rely
/// on [`PriceLists::default_list`] without failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceLists {
    lists: Vec<PriceList>,
    #[serde(skip)]
    default_index: usize,
}

impl PriceLists {
    /// Validates and wraps the catalog's lists.
    ///
    /// ## Errors
    /// - `Validation(Required)` if a list has an empty id
    /// - `Validation(Duplicate)` if two lists share an id
    /// - `NoDefaultPriceList` / `MultipleDefaultPriceLists`
    pub fn new(lists: Vec<PriceList>) -> CoreResult<Self> {
        let mut seen = HashSet::new();
        for list in &lists {
            if list.id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "price list id".to_string(),
                }
                .into());
            }
            if !seen.insert(list.id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "price list id".to_string(),
                    value: list.id.clone(),
                }
                .into());
            }
        }

        let defaults: Vec<usize> = lists
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_default)
            .map(|(i, _)| i)
            .collect();

        match defaults.as_slice() {
            [] => Err(CoreError::NoDefaultPriceList),
            [index] => Ok(PriceLists {
                default_index: *index,
                lists,
            }),
            _ => Err(CoreError::MultipleDefaultPriceLists {
                ids: defaults.iter().map(|&i| lists[i].id.clone()).collect(),
            }),
        }
    }

    /// The list every other list falls back to.
    #[inline]
    pub fn default_list(&self) -> &PriceList {
        &self.lists[self.default_index]
    }

    pub fn get(&self, id: &str) -> Option<&PriceList> {
        self.lists.iter().find(|l| l.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceList> {
        self.lists.iter()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl<'de> Deserialize<'de> for PriceLists {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            lists: Vec<PriceList>,
        }

        let raw = Raw::deserialize(deserializer)?;
        PriceLists::new(raw.lists).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product as delivered by the catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    #[serde(default)]
    pub sku: String,

    pub name: String,

    /// Inactive products cannot be added to a cart.
    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Price entry per price list id.
    #[serde(default)]
    pub prices: BTreeMap<String, PriceEntry>,

    /// Units available. `None` disables stock clamping for this product.
    #[serde(default)]
    pub stock_on_hand: Option<i64>,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// The raw entry for one list, without fallback.
    #[inline]
    pub fn price_in(&self, list_id: &str) -> Option<&PriceEntry> {
        self.prices.get(list_id)
    }

    /// Checks whether `quantity` units can be sold given the stock snapshot.
    pub fn can_sell(&self, quantity: i64) -> bool {
        match self.stock_on_hand {
            Some(stock) => quantity <= stock,
            None => true,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
