//! Order placement and order history.

use thiserror::Error;
use tracing::{instrument, warn};

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::types::{OrderConfirmation, OrderSummary, Page, PlaceOrderRequest};

/// Fallback shown when the backend rejects an order without a message.
const ORDER_FALLBACK: &str = "Order creation failed.";

/// Errors surfaced to the user from order flows.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The backend rejected the order; the message is the backend's own
    /// wording, or a generic fallback.
    #[error("{0}")]
    Rejected(String),

    /// The session expired mid-call.
    #[error("your session has expired; please log in again")]
    SessionExpired,
}

/// Client for the authenticated order endpoints.
#[derive(Clone)]
pub struct Orders {
    gateway: ApiGateway,
}

impl Orders {
    #[must_use]
    pub const fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Rejected`] with a user-displayable message when
    /// the backend refuses, and [`OrderError::SessionExpired`] when the token
    /// went stale mid-checkout.
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn place(&self, request: &PlaceOrderRequest) -> Result<OrderConfirmation, OrderError> {
        match self.gateway.post("/v1/orders", request).await {
            Ok(confirmation) => Ok(confirmation),
            Err(ApiError::SessionExpired) => Err(OrderError::SessionExpired),
            Err(err) => {
                warn!(error = %err, "order placement failed");
                Err(OrderError::Rejected(err.user_message(ORDER_FALLBACK)))
            }
        }
    }

    /// The signed-in user's order history, newest first, paged.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn history(&self, page: u32, size: u32) -> Result<Page<OrderSummary>, ApiError> {
        self.gateway
            .get_query(
                "/v1/orders/my-orders",
                &[("page", page.to_string()), ("size", size.to_string())],
            )
            .await
    }
}
