//! # Catalog State
//!
//! Read-only snapshot of products and price lists the terminal sells from.
//!
//! ## Snapshot Format
//! ```json
//! {
//!   "priceLists": { "lists": [
//!     { "id": "retail", "name": "Retail", "isDefault": true },
//!     { "id": "wholesale", "name": "Wholesale" }
//!   ]},
//!   "products": [{
//!     "id": "p-1", "sku": "COKE-330", "name": "Coca-Cola 330ml",
//!     "stockOnHand": 24,
//!     "prices": {
//!       "retail":    { "listPrice": 199, "maxMargin": 60, "minMargin": 20 },
//!       "wholesale": { "listPrice": 169, "maxMargin": 30, "minMargin": 10 }
//!     }
//!   }]
//! }
//! ```
//!
//! Amounts are cents. The price-list set is validated while parsing, so a
//! catalog without exactly one default list never loads. Every price entry
//! amount must lie in `[0, MAX_PRICE_CENTS]`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use tienda_core::input::validate_price_entry;
use tienda_core::{CoreError, PriceLists, Product, ValidationError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No catalog path configured")]
    NotConfigured,

    #[error("Failed to read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate product id in catalog: {0}")]
    DuplicateProduct(String),

    #[error("Invalid price for product {product_id}: {source}")]
    InvalidPrice {
        product_id: String,
        #[source]
        source: ValidationError,
    },
}

/// Catalog as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub price_lists: PriceLists,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Indexed catalog shared by all commands.
#[derive(Debug, Clone)]
pub struct CatalogState {
    products: HashMap<String, Product>,
    price_lists: PriceLists,
}

impl CatalogState {
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self, CatalogError> {
        let mut products = HashMap::with_capacity(snapshot.products.len());
        for product in snapshot.products {
            if products.contains_key(&product.id) {
                return Err(CatalogError::DuplicateProduct(product.id));
            }
            for (list_id, entry) in &product.prices {
                validate_price_entry(&format!("prices.{}", list_id), entry).map_err(|source| {
                    CatalogError::InvalidPrice {
                        product_id: product.id.clone(),
                        source,
                    }
                })?;
            }
            products.insert(product.id.clone(), product);
        }

        Ok(CatalogState {
            products,
            price_lists: snapshot.price_lists,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::from_snapshot(serde_json::from_str(json)?)
    }

    /// Reads a catalog snapshot file.
    pub fn load_json(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;

        info!(
            ?path,
            products = catalog.products.len(),
            price_lists = catalog.price_lists.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    pub fn price_lists(&self) -> &PriceLists {
        &self.price_lists
    }

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    /// Same as [`CatalogState::product`], as a command error.
    pub fn find_product(&self, id: &str) -> Result<&Product, CoreError> {
        self.product(id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}
