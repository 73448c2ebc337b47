//! # Commit Gateway
//!
//! Outbound boundary between the terminal and the backend that stores
//! sales and quotations.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Commit Flow                                     │
//! │                                                                         │
//! │  CartState ──lock──► Checkout::from_cart ──unlock──► CommitRequest      │
//! │                                                          │              │
//! │                                                          ▼              │
//! │                                              CommitGateway::commit      │
//! │                                               │                  │      │
//! │                                         Ok(receipt)        Err(error)   │
//! │                                               │                  │      │
//! │                                         cart.clear()      cart kept     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The gateway owns stock levels and cash sessions. Its domain errors are
//! passed back to the operator unchanged.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use tienda_core::Checkout;

/// Which document a commit creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Sale,
    Quotation,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Sale => write!(f, "sale"),
            DocumentKind::Quotation => write!(f, "quotation"),
        }
    }
}

/// Payload handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    /// Idempotency key; a retried request carries the same id.
    pub request_id: Uuid,
    pub tenant_id: String,
    pub kind: DocumentKind,
    pub client_id: Option<String>,
    pub checkout: Checkout,
    pub requested_at: DateTime<Utc>,
}

impl CommitRequest {
    pub fn new(kind: DocumentKind, tenant_id: impl Into<String>, checkout: Checkout) -> Self {
        CommitRequest {
            request_id: Uuid::new_v4(),
            tenant_id: tenant_id.into(),
            kind,
            client_id: checkout.client_id.clone(),
            checkout,
            requested_at: Utc::now(),
        }
    }
}

/// Backend acknowledgement of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    pub document_id: String,
    pub committed_at: DateTime<Utc>,
}

/// Reasons the backend refused a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// Stock moved since the catalog snapshot was taken.
    #[error("Insufficient stock for {product_id}: {available} available")]
    InsufficientStock { product_id: String, available: i64 },

    #[error("No cash session is open on this terminal")]
    CashSessionClosed,

    #[error("Document rejected: {0}")]
    Rejected(String),

    /// Transport failure; the request may be retried with the same id.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Stores committed documents.
pub trait CommitGateway: Send + Sync {
    fn commit(
        &self,
        request: CommitRequest,
    ) -> impl Future<Output = Result<CommitReceipt, CommitError>> + Send;
}

// =============================================================================
// In-Memory Gateway
// =============================================================================

/// Gateway that keeps documents in memory.
///
/// Used when the terminal runs detached from a backend. A preset failure
/// makes the next commit fail.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    inner: Arc<Mutex<InMemoryInner>>,
}

#[derive(Debug, Default)]
struct InMemoryInner {
    committed: Vec<CommitRequest>,
    next_failure: Option<CommitError>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit fail with `error`.
    pub fn fail_next(&self, error: CommitError) {
        self.lock().next_failure = Some(error);
    }

    /// All requests accepted so far, oldest first.
    pub fn committed(&self) -> Vec<CommitRequest> {
        self.lock().committed.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CommitGateway for InMemoryGateway {
    async fn commit(&self, request: CommitRequest) -> Result<CommitReceipt, CommitError> {
        let mut inner = self.lock();
        if let Some(error) = inner.next_failure.take() {
            return Err(error);
        }

        let receipt = CommitReceipt {
            document_id: format!("{}-{:05}", request.kind, inner.committed.len() + 1),
            committed_at: Utc::now(),
        };
        inner.committed.push(request);
        Ok(receipt)
    }
}
