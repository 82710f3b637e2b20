//! Client SDK for the Aba Market storefront API.
//!
//! The entry point is [`StoreClient`], which wires up the shared pieces:
//!
//! - [`identity::IdentityStore`] owns the persisted session identity (auth
//!   token and guest cart id) and is the single writer for it.
//! - [`gateway::ApiGateway`] is the one outbound HTTP path. It attaches the
//!   identity to every request and centralizes the reaction to expired
//!   sessions.
//! - [`cart::CartSession`] and [`auth::AuthSession`] manage the server-held
//!   cart and the signed-in user, including the guest-to-user cart merge at
//!   login.
//! - [`catalog::Catalog`], [`account::Account`] and [`orders::Orders`] cover
//!   the remaining storefront endpoints.
//!
//! ```no_run
//! use aba_market_client::{ClientConfig, StoreClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let client = StoreClient::new(&config)?;
//! client.auth().restore().await;
//! client.cart().fetch().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod orders;
pub mod types;

use thiserror::Error;

pub use account::Account;
pub use auth::{AuthError, AuthSession, AuthState, Credentials, NewAccount};
pub use cart::{CartError, CartSession, CartState};
pub use catalog::Catalog;
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use gateway::{ApiGateway, SessionEvent};
pub use identity::{FileStorage, IdentityStore, MemoryStorage};
pub use orders::{OrderError, Orders};

use tokio::sync::broadcast;

/// Errors from building a [`StoreClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// The assembled storefront client.
///
/// Cheaply cloneable; all clones share the same identity, gateway and session
/// state.
#[derive(Clone)]
pub struct StoreClient {
    identity: IdentityStore,
    gateway: ApiGateway,
    cart: CartSession,
    auth: AuthSession,
    catalog: Catalog,
    account: Account,
    orders: Orders,
}

impl StoreClient {
    /// Build a client with file-backed identity persistence at the configured
    /// path.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let identity = IdentityStore::open(FileStorage::new(&config.identity_path));
        Self::with_identity(config, identity)
    }

    /// Build a client over a pre-opened identity store. Used by tests to
    /// substitute in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_identity(
        config: &ClientConfig,
        identity: IdentityStore,
    ) -> Result<Self, ClientError> {
        let gateway = ApiGateway::new(config, identity.clone())?;
        let cart = CartSession::new(gateway.clone());
        let auth = AuthSession::new(gateway.clone(), identity.clone(), cart.clone());
        let catalog = Catalog::new(gateway.clone());
        let account = Account::new(gateway.clone(), auth.clone());
        let orders = Orders::new(gateway.clone());

        Ok(Self {
            identity,
            gateway,
            cart,
            auth,
            catalog,
            account,
            orders,
        })
    }

    /// The session identity store.
    #[must_use]
    pub const fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    /// The cart session manager.
    #[must_use]
    pub const fn cart(&self) -> &CartSession {
        &self.cart
    }

    /// The auth session manager.
    #[must_use]
    pub const fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// The catalog client.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The account client.
    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    /// The orders client.
    #[must_use]
    pub const fn orders(&self) -> &Orders {
        &self.orders
    }

    /// Subscribe to session events (expiry notifications).
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.gateway.subscribe()
    }
}
