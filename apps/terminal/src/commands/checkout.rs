//! # Checkout Commands
//!
//! Commits the cart as a sale or a quotation through the [`CommitGateway`].
//!
//! ## Locking
//! The checkout is built under the cart lock and the lock is released
//! before the gateway is awaited; the cart is cleared only once the backend
//! acknowledges the document. A refused commit leaves the cart untouched so
//! the operator can fix it and retry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tienda_core::{Checkout, Money};

use crate::error::{ApiError, ErrorCode};
use crate::gateway::{CommitGateway, CommitRequest, DocumentKind};
use crate::state::{CartState, CatalogState, ConfigState, TerminalMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub document_id: String,
    pub kind: DocumentKind,
    pub request_id: Uuid,
    pub final_total: Money,
    pub item_count: usize,
    pub committed_at: DateTime<Utc>,
}

/// Commits the cart as a sale.
///
/// ## Errors
/// - `BUSINESS_LOGIC` on a quotation terminal (stock was never checked)
/// - `CART_ERROR` for an empty or inconsistent cart
/// - gateway refusals (`INSUFFICIENT_STOCK`, `CASH_SESSION_CLOSED`, ...)
pub async fn commit_sale<G: CommitGateway>(
    gateway: &G,
    config: &ConfigState,
    catalog: &CatalogState,
    cart: &CartState,
) -> Result<CommitResponse, ApiError> {
    debug!("commit_sale command");

    if config.mode == TerminalMode::Quotation {
        return Err(ApiError::new(
            ErrorCode::BusinessLogic,
            "This terminal builds quotations and cannot commit sales",
        ));
    }

    commit(gateway, DocumentKind::Sale, config, catalog, cart).await
}

/// Commits the cart as a quotation.
pub async fn commit_quotation<G: CommitGateway>(
    gateway: &G,
    config: &ConfigState,
    catalog: &CatalogState,
    cart: &CartState,
) -> Result<CommitResponse, ApiError> {
    debug!("commit_quotation command");
    commit(gateway, DocumentKind::Quotation, config, catalog, cart).await
}

async fn commit<G: CommitGateway>(
    gateway: &G,
    kind: DocumentKind,
    config: &ConfigState,
    catalog: &CatalogState,
    cart: &CartState,
) -> Result<CommitResponse, ApiError> {
    let checkout = cart.with_cart(|c| Checkout::from_cart(c, catalog.price_lists()))?;

    let request = CommitRequest::new(kind, config.tenant_id.clone(), checkout);
    let request_id = request.request_id;
    let final_total = request.checkout.totals.final_total;
    let item_count = request.checkout.item_count();

    let receipt = gateway.commit(request).await.map_err(|e| {
        warn!(request_id = %request_id, kind = %kind, error = %e, "Commit rejected");
        e
    })?;

    cart.with_cart_mut(|c| c.clear());

    info!(
        document_id = %receipt.document_id,
        request_id = %request_id,
        kind = %kind,
        total = %final_total,
        items = item_count,
        "Document committed"
    );

    Ok(CommitResponse {
        document_id: receipt.document_id,
        kind,
        request_id,
        final_total,
        item_count,
        committed_at: receipt.committed_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, get_cart, select_client, set_custom_price, set_discount};
    use crate::commands::test_support::setup;
    use crate::gateway::{CommitError, InMemoryGateway};

    fn config(mode: TerminalMode) -> ConfigState {
        ConfigState {
            tenant_id: "tenant-1".to_string(),
            mode,
            ..ConfigState::default()
        }
    }

    #[tokio::test]
    async fn test_commit_sale_sends_checkout_and_clears_cart() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        let gateway = InMemoryGateway::new();

        add_to_cart(&catalog, &cart, "a".into()).unwrap();
        set_custom_price(&catalog, &cart, "a".into(), "90".into()).unwrap();
        set_discount(&catalog, &cart, "5".into()).unwrap();
        select_client(&catalog, &cart, Some("client-9".into())).unwrap();

        let response = commit_sale(&gateway, &config(TerminalMode::Sales), &catalog, &cart)
            .await
            .unwrap();

        assert_eq!(response.kind, DocumentKind::Sale);
        assert_eq!(response.item_count, 1);
        assert_eq!(response.final_total, Money::from_units(85));

        let committed = gateway.committed();
        assert_eq!(committed.len(), 1);
        let request = &committed[0];
        assert_eq!(request.request_id, response.request_id);
        assert_eq!(request.tenant_id, "tenant-1");
        assert_eq!(request.client_id.as_deref(), Some("client-9"));
        assert_eq!(request.checkout.lines[0].effective_price, Money::from_units(90));
        assert_eq!(request.checkout.totals.global_discount, Money::from_units(5));

        assert_eq!(get_cart(&catalog, &cart).unwrap().item_count, 0);
    }

    #[tokio::test]
    async fn test_rejected_commit_keeps_cart() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        let gateway = InMemoryGateway::new();
        add_to_cart(&catalog, &cart, "b".into()).unwrap();

        gateway.fail_next(CommitError::CashSessionClosed);
        let err = commit_sale(&gateway, &config(TerminalMode::Sales), &catalog, &cart)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CashSessionClosed);
        assert!(gateway.committed().is_empty());
        assert_eq!(get_cart(&catalog, &cart).unwrap().item_count, 1);

        // Retrying after the session is opened goes through
        commit_sale(&gateway, &config(TerminalMode::Sales), &catalog, &cart)
            .await
            .unwrap();
        assert_eq!(gateway.committed().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_is_not_sent() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        let gateway = InMemoryGateway::new();

        let err = commit_quotation(&gateway, &config(TerminalMode::Sales), &catalog, &cart)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::CartError);
        assert!(gateway.committed().is_empty());
    }

    #[tokio::test]
    async fn test_quotation_terminal_commits_quotations_only() {
        let (catalog, cart) = setup(TerminalMode::Quotation);
        let gateway = InMemoryGateway::new();
        add_to_cart(&catalog, &cart, "a".into()).unwrap();

        let err = commit_sale(&gateway, &config(TerminalMode::Quotation), &catalog, &cart)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let response = commit_quotation(&gateway, &config(TerminalMode::Quotation), &catalog, &cart)
            .await
            .unwrap();
        assert_eq!(response.kind, DocumentKind::Quotation);
        assert_eq!(gateway.committed()[0].kind, DocumentKind::Quotation);
    }

    #[tokio::test]
    async fn test_gateway_stock_error_is_surfaced() {
        let (catalog, cart) = setup(TerminalMode::Sales);
        let gateway = InMemoryGateway::new();
        add_to_cart(&catalog, &cart, "a".into()).unwrap();

        gateway.fail_next(CommitError::InsufficientStock {
            product_id: "a".to_string(),
            available: 0,
        });
        let err = commit_sale(&gateway, &config(TerminalMode::Sales), &catalog, &cart)
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(get_cart(&catalog, &cart).unwrap().item_count, 1);
    }
}
