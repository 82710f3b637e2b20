//! The Auth Session Manager.
//!
//! Owns the login/signup/logout flows and the in-memory view of who is
//! signed in. Login is where the anonymous identity is reconciled: the guest
//! cart id rides along in the login request so the backend can merge the
//! guest cart, and on success the id is cleared and the cart re-fetched.

use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::cart::CartSession;
use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::identity::IdentityStore;
use crate::types::{LoginRequest, LoginResponse, RegisterRequest, UserProfile};

/// Fallback shown when the backend rejects a signup without a message.
const SIGNUP_FALLBACK: &str = "Registration failed. Try again.";

/// Errors surfaced to the user from auth flows.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login rejected. Deliberately uniform: wrong password and unknown
    /// account collapse into this, so the message never reveals whether the
    /// account exists.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The login request never completed (backend unreachable, timeout).
    /// Not a credential problem, so the uniform rejection would mislead.
    #[error("could not reach the store; check your connection and try again")]
    Unavailable,

    /// The backend rejected the signup; the message is the backend's own
    /// wording, or a generic fallback.
    #[error("{0}")]
    Registration(String),

    /// The token was granted but the profile fetch failed. The session has
    /// been rolled back to anonymous.
    #[error("could not load your account; please try again")]
    ProfileUnavailable,
}

/// Who is signed in, as far as the client knows.
#[derive(Debug, Clone, Default)]
pub enum AuthState {
    /// No valid token.
    #[default]
    Unauthenticated,
    /// A login is in flight.
    Authenticating,
    /// Signed in, with the profile from the backend.
    Authenticated(UserProfile),
}

impl AuthState {
    /// The signed-in profile, if any.
    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        match self {
            Self::Authenticated(profile) => Some(profile),
            Self::Unauthenticated | Self::Authenticating => None,
        }
    }

    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Login credentials. The username is the account email.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Details for a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

struct AuthSessionInner {
    gateway: ApiGateway,
    identity: IdentityStore,
    cart: CartSession,
    state: RwLock<AuthState>,
}

/// Manager for the authenticated session.
#[derive(Clone)]
pub struct AuthSession {
    inner: Arc<AuthSessionInner>,
}

impl AuthSession {
    /// Create an auth session over the shared gateway, identity and cart.
    #[must_use]
    pub fn new(gateway: ApiGateway, identity: IdentityStore, cart: CartSession) -> Self {
        Self {
            inner: Arc::new(AuthSessionInner {
                gateway,
                identity,
                cart,
                state: RwLock::new(AuthState::Unauthenticated),
            }),
        }
    }

    /// A snapshot of the current auth state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The signed-in profile, if any.
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        self.state().profile().cloned()
    }

    /// Log in, merging any guest cart into the account's cart.
    ///
    /// The sequence is fixed: exchange credentials for a token (the guest
    /// cart id rides along so the backend can merge), store the token, fetch
    /// the profile, drop the guest id, then re-fetch the cart so the merged
    /// contents show up.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for any login rejection,
    /// [`AuthError::Unavailable`] when the request itself never completed,
    /// and [`AuthError::ProfileUnavailable`] when the token was granted but
    /// the profile could not be loaded (the session is rolled back to
    /// anonymous).
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, AuthError> {
        self.set_state(AuthState::Authenticating);

        let body = LoginRequest {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            guest_id: self.inner.identity.guest_id(),
        };

        let granted = match self
            .inner
            .gateway
            .post_public::<LoginResponse>("/v1/auth/login", &body)
            .await
        {
            Ok(response) => response,
            Err(ApiError::Http(err)) => {
                warn!(error = %err, "login request did not complete");
                self.set_state(AuthState::Unauthenticated);
                return Err(AuthError::Unavailable);
            }
            Err(err) => {
                // Uniform rejection; the precise cause goes to the log only.
                debug!(error = %err, "login rejected");
                self.set_state(AuthState::Unauthenticated);
                return Err(AuthError::InvalidCredentials);
            }
        };

        self.inner.identity.set_token(&granted.access_token);

        let profile = match self.inner.gateway.get::<UserProfile>("/v1/users/me").await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(error = %err, "profile fetch failed after login; rolling back");
                self.inner.identity.clear_token();
                self.set_state(AuthState::Unauthenticated);
                return Err(AuthError::ProfileUnavailable);
            }
        };

        // The guest cart is merged server-side at this point; the id has
        // served its purpose.
        self.inner.identity.clear_guest_id();
        self.set_state(AuthState::Authenticated(profile.clone()));
        self.inner.cart.refresh().await;

        Ok(profile)
    }

    /// Create an account. Does not sign the user in; callers chain a
    /// [`login`](Self::login) when they want that.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Registration`] with a user-displayable message.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn signup(&self, account: &NewAccount) -> Result<(), AuthError> {
        let body = RegisterRequest {
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
            password: account.password.clone(),
        };

        self.inner
            .gateway
            .post_public_discard("/v1/auth/register", &body)
            .await
            .map_err(|err| {
                warn!(error = %err, "signup failed");
                AuthError::Registration(err.user_message(SIGNUP_FALLBACK))
            })
    }

    /// Log out. Purely local: the token is dropped and the state reset; no
    /// backend call is made.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.inner.identity.clear_token();
        self.set_state(AuthState::Unauthenticated);
        self.inner.cart.fetch().await;
    }

    /// Restore a persisted session at startup.
    ///
    /// With a persisted token, probes the profile endpoint. Any failure
    /// takes the local logout path: a token that cannot be confirmed is
    /// dropped rather than kept behind a signed-out state, so the session
    /// never reports anonymous while requests still carry a bearer. No
    /// session-expired event fires, since there is no user mid-task to
    /// interrupt.
    #[instrument(skip(self))]
    pub async fn restore(&self) {
        if self.inner.identity.token().is_none() {
            return;
        }

        match self
            .inner
            .gateway
            .get_silent::<UserProfile>("/v1/users/me")
            .await
        {
            Ok(profile) => {
                self.set_state(AuthState::Authenticated(profile));
            }
            Err(err) => {
                debug!(error = %err, "persisted session not restored");
                self.inner.identity.clear_token();
                self.set_state(AuthState::Unauthenticated);
            }
        }
    }

    /// Replace the cached profile after an account update.
    pub(crate) fn replace_profile(&self, profile: UserProfile) {
        self.set_state(AuthState::Authenticated(profile));
    }

    fn set_state(&self, next: AuthState) {
        *self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }
}
