//! # Tienda Terminal Library
//!
//! Session layer for the sales terminal and the quotation builder: loads
//! configuration and the catalog, owns the cart, and exposes commands.
//!
//! ## Module Organization
//! ```text
//! tienda_terminal/
//! ├── lib.rs          ◄─── You are here (Session, tracing setup)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── cart.rs     ◄─── Cart behind a mutex
//! │   ├── catalog.rs  ◄─── Product / price list snapshot
//! │   └── config.rs   ◄─── Terminal configuration
//! ├── commands/
//! │   ├── cart.rs     ◄─── Cart manipulation commands
//! │   ├── checkout.rs ◄─── Commit commands
//! │   └── quote.rs    ◄─── Declarative cart replay
//! ├── gateway.rs      ◄─── Outbound commit boundary
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Startup                                   │
//! │                                                                         │
//! │  1. ConfigState::load ─── env > tienda.toml > defaults                  │
//! │                                                                         │
//! │  2. CatalogState::load_json ─── products + price lists (validated)      │
//! │                                                                         │
//! │  3. Session::start ─── empty cart with the mode's stock policy and      │
//! │                        the configured default tax rate                  │
//! │                                                                         │
//! │  4. Commands ─── commands::cart::*, commands::checkout::*               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod gateway;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

use state::{CartState, CatalogError, CatalogState, ConfigState};

/// One terminal's state: configuration, catalog and the current cart.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: ConfigState,
    pub catalog: CatalogState,
    pub cart: CartState,
}

impl Session {
    /// Starts a session with an empty cart.
    pub fn start(config: ConfigState, catalog: CatalogState) -> Self {
        let cart = CartState::for_config(&config);

        info!(
            tenant_id = %config.tenant_id,
            mode = %config.mode,
            products = catalog.product_count(),
            "Session started"
        );

        Session {
            config,
            catalog,
            cart,
        }
    }

    /// Starts a session with the catalog named by `config.catalog_path`.
    pub fn open(config: ConfigState) -> Result<Self, CatalogError> {
        let path = config.catalog_path.clone().ok_or(CatalogError::NotConfigured)?;
        let catalog = CatalogState::load_json(&path)?;
        Ok(Session::start(config, catalog))
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tienda=trace` - Show trace for tienda crates only
/// - Default: INFO, DEBUG for tienda crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tienda=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
