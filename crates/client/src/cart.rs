//! The Cart Session Manager.
//!
//! Holds the last-fetched copy of the server-owned cart and replaces it
//! wholesale with every mutation response - the backend recomputes totals and
//! stock, and the client never derives money amounts itself.
//!
//! Because in-flight calls are not cancelled, two rapid mutations can settle
//! out of order. Every cart-replacing operation therefore takes a ticket from
//! a monotone counter before sending; a settlement only lands if no
//! higher-ticket settlement got there first, otherwise it is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use aba_market_core::{Price, VariantId};
use rust_decimal::Decimal;

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::types::{AddItemRequest, Cart};

/// Fallback shown when the backend rejects an add without a message.
const ADD_ITEM_FALLBACK: &str = "Could not add item";

/// Errors surfaced to the user from cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be at least 1.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The backend rejected the mutation; the message is the backend's own
    /// wording, or a generic fallback.
    #[error("{0}")]
    Rejected(String),

    /// The session expired mid-call; the gateway has already cleared the
    /// token and announced the redirect.
    #[error("your session has expired; please log in again")]
    SessionExpired,
}

/// Client-side view of the cart.
///
/// `Loading` and `Error` keep the previous cart so the UI can keep rendering
/// it; a failed background refresh never blanks a cart the user can see.
#[derive(Debug, Clone, Default)]
pub enum CartState {
    /// No cart exists for this session (including the 404-on-fetch case).
    #[default]
    Empty,
    /// A fetch is in flight.
    Loading { previous: Option<Cart> },
    /// The last server response.
    Loaded(Cart),
    /// The last fetch failed; `previous` is still displayable.
    Error { previous: Option<Cart> },
}

impl CartState {
    /// The cart to render, if any.
    #[must_use]
    pub const fn cart(&self) -> Option<&Cart> {
        match self {
            Self::Empty => None,
            Self::Loaded(cart) => Some(cart),
            Self::Loading { previous } | Self::Error { previous } => previous.as_ref(),
        }
    }

    /// Whether a fetch is currently in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

struct StateCell {
    state: CartState,
    applied_ticket: u64,
}

struct CartSessionInner {
    gateway: ApiGateway,
    cell: RwLock<StateCell>,
    tickets: AtomicU64,
}

/// Manager for the server-held cart.
#[derive(Clone)]
pub struct CartSession {
    inner: Arc<CartSessionInner>,
}

impl CartSession {
    /// Create a cart session over the given gateway.
    #[must_use]
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            inner: Arc::new(CartSessionInner {
                gateway,
                cell: RwLock::new(StateCell {
                    state: CartState::Empty,
                    applied_ticket: 0,
                }),
                tickets: AtomicU64::new(0),
            }),
        }
    }

    /// A snapshot of the current cart state.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner
            .cell
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state
            .clone()
    }

    /// Sum of item quantities in the displayable cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.state().cart().map_or(0, Cart::item_count)
    }

    /// The backend's total for the displayable cart, or zero.
    #[must_use]
    pub fn total(&self) -> Price {
        self.state()
            .cart()
            .map_or_else(|| Price::naira(Decimal::ZERO), Cart::total_price)
    }

    /// Fetch the cart from the backend.
    ///
    /// A 404 is the legitimate "new session, no cart yet" answer and yields
    /// the empty state. Any other failure is logged and leaves the previous
    /// cart displayable; it is not surfaced as a blocking error.
    #[instrument(skip(self))]
    pub async fn fetch(&self) {
        let ticket = self.take_ticket();
        {
            let mut cell = self
                .inner
                .cell
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            // A newer settlement may already have landed; don't regress it
            // to Loading.
            if ticket > cell.applied_ticket {
                cell.state = CartState::Loading {
                    previous: cell.state.cart().cloned(),
                };
            }
        }

        match self.inner.gateway.get::<Cart>("/v1/cart").await {
            Ok(cart) => {
                self.apply(ticket, |_| CartState::Loaded(cart));
            }
            Err(ApiError::NotFound(_)) => {
                self.apply(ticket, |_| CartState::Empty);
            }
            Err(err) => {
                warn!(error = %err, "cart fetch failed");
                self.apply(ticket, |current| CartState::Error {
                    previous: current.cart().cloned(),
                });
            }
        }
    }

    /// Re-fetch the cart; used after login to pick up the merged cart.
    pub async fn refresh(&self) {
        self.fetch().await;
    }

    /// Add `quantity` of a variant to the cart.
    ///
    /// On success the local cart is replaced with the server's recomputed
    /// cart, which is also returned.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity, and
    /// [`CartError::Rejected`] with a user-displayable message when the
    /// backend refuses (out of stock, unknown variant, ...).
    #[instrument(skip(self))]
    pub async fn add_item(&self, variant_id: VariantId, quantity: u32) -> Result<Cart, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let ticket = self.take_ticket();
        let body = AddItemRequest {
            variant_id,
            quantity,
        };

        match self.inner.gateway.post::<Cart>("/v1/cart/add", &body).await {
            Ok(cart) => {
                self.apply(ticket, |_| CartState::Loaded(cart.clone()));
                Ok(cart)
            }
            Err(ApiError::SessionExpired) => Err(CartError::SessionExpired),
            Err(err) => {
                warn!(error = %err, "add to cart failed");
                Err(CartError::Rejected(err.user_message(ADD_ITEM_FALLBACK)))
            }
        }
    }

    /// Remove a variant from the cart.
    ///
    /// Failures are logged only; the cart re-syncs on the next fetch.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, variant_id: VariantId) {
        let ticket = self.take_ticket();
        let path = format!("/v1/cart/remove/{variant_id}");

        match self.inner.gateway.delete::<Cart>(&path).await {
            Ok(cart) => {
                self.apply(ticket, |_| CartState::Loaded(cart));
            }
            Err(err) => {
                warn!(error = %err, "remove from cart failed");
            }
        }
    }

    /// Clear the cart.
    ///
    /// On success the local state becomes empty regardless of what the
    /// server responded with; failures are logged only.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        let ticket = self.take_ticket();

        match self.inner.gateway.delete_discard("/v1/cart/clear").await {
            Ok(()) => {
                self.apply(ticket, |_| CartState::Empty);
            }
            Err(err) => {
                warn!(error = %err, "clear cart failed");
            }
        }
    }

    fn take_ticket(&self) -> u64 {
        self.inner.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a settlement. Returns `false` (and leaves the state untouched)
    /// if a higher-ticket settlement already landed.
    fn apply(&self, ticket: u64, next: impl FnOnce(&CartState) -> CartState) -> bool {
        let mut cell = self
            .inner
            .cell
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if ticket <= cell.applied_ticket {
            debug!(ticket, applied = cell.applied_ticket, "dropping stale cart response");
            return false;
        }
        cell.applied_ticket = ticket;
        cell.state = next(&cell.state);
        true
    }
}
