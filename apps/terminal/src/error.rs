//! # API Error Type
//!
//! Unified error type for terminal commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Terminal                           │
//! │                                                                         │
//! │  Command Function  ──  Result<T, ApiError>                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Cart rule violated? ─── CoreError::Unpriced ─────────┐                 │
//! │         │                                             │                 │
//! │         ▼                                             ▼                 │
//! │  Backend refused?   ─── CommitError::CashSessionClosed ── ApiError ───► │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ─────────────────────────────────────────────────────────────► │
//! │                                                                         │
//! │  Client receives { "code": "UNPRICED", "message": "..." }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business states the operator must act on (unpriced product, stock
//! exhausted, price outside the margin envelope, closed cash session) get
//! their own codes so the client can show a specific prompt.

use serde::Serialize;
use tienda_core::{CoreError, PricingError};

use crate::gateway::CommitError;
use crate::state::CatalogError;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "PRICE_OUT_OF_RANGE",
///   "message": "Price cannot be lower than 80.00"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Business logic error (422)
    BusinessLogic,

    /// Internal error (500): amounts the engine cannot represent
    Internal,

    /// Cart operation failed
    CartError,

    /// Product has no usable price
    Unpriced,

    /// Insufficient stock
    InsufficientStock,

    /// Custom price outside `[min_price, list_price]`
    PriceOutOfRange,

    /// Catalog snapshot missing or malformed
    CatalogError,

    /// Backend requires an open cash session
    CashSessionClosed,

    /// Backend could not be reached
    GatewayUnavailable,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Creates a cart error.
    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::LineNotFound(id) => ApiError::not_found("Cart line", &id),
            CoreError::UnknownPriceList(id) => ApiError::not_found("Price list", &id),
            CoreError::ProductInactive(id) => ApiError::new(
                ErrorCode::BusinessLogic,
                format!("Product {} is not available for sale", id),
            ),
            CoreError::Unpriced { product_id } => ApiError::new(
                ErrorCode::Unpriced,
                format!("Product {} has no price in this price list", product_id),
            ),
            CoreError::StockExceeded {
                product_id,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for {}: {} available, {} requested",
                    product_id, available, requested
                ),
            ),
            e @ (CoreError::NoDefaultPriceList | CoreError::MultipleDefaultPriceLists { .. }) => {
                tracing::error!("Catalog misconfigured: {}", e);
                ApiError::new(ErrorCode::CatalogError, e.to_string())
            }
            CoreError::AmountOverflow => {
                tracing::error!("Cart amounts out of range");
                ApiError::internal("Cart amounts exceed the supported range")
            }
            CoreError::EmptyCart => ApiError::cart("Cart is empty"),
            CoreError::InvalidCart { reason } => {
                tracing::error!("Cart failed checkout verification: {}", reason);
                ApiError::cart(format!("Cart cannot be committed: {}", reason))
            }
            CoreError::Pricing(e) => ApiError::from(e),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts custom price rejections to API errors.
impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::InvalidNumber { .. } => ApiError::validation(err.to_string()),
            PricingError::BelowMinimumMargin { .. } | PricingError::AboveListPrice { .. } => {
                ApiError::new(ErrorCode::PriceOutOfRange, err.to_string())
            }
        }
    }
}

/// Converts backend refusals to API errors.
impl From<CommitError> for ApiError {
    fn from(err: CommitError) -> Self {
        let code = match &err {
            CommitError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CommitError::CashSessionClosed => ErrorCode::CashSessionClosed,
            CommitError::Rejected(_) => ErrorCode::BusinessLogic,
            CommitError::Unavailable(_) => ErrorCode::GatewayUnavailable,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts catalog loading errors to API errors.
impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        tracing::error!("Catalog error: {}", err);
        ApiError::new(ErrorCode::CatalogError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
