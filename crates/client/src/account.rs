//! Account endpoints: the current user's profile and default address.

use tracing::instrument;

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::types::{Address, UpdateAddressRequest, UserProfile};

/// Client for the authenticated account endpoints.
#[derive(Clone)]
pub struct Account {
    gateway: ApiGateway,
    auth: AuthSession,
}

impl Account {
    #[must_use]
    pub fn new(gateway: ApiGateway, auth: AuthSession) -> Self {
        Self { gateway, auth }
    }

    /// Fetch the signed-in user's profile from the backend.
    ///
    /// # Errors
    ///
    /// See [`ApiError`]; an expired session yields [`ApiError::SessionExpired`].
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        let profile = self.gateway.get::<UserProfile>("/v1/users/me").await?;
        self.auth.replace_profile(profile.clone());
        Ok(profile)
    }

    /// Replace the default address. Returns the updated profile, which also
    /// replaces the cached one.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self, address))]
    pub async fn update_address(&self, address: Address) -> Result<UserProfile, ApiError> {
        let body = UpdateAddressRequest { address };
        let profile = self
            .gateway
            .put::<UserProfile>("/v1/users/me/address", &body)
            .await?;
        self.auth.replace_profile(profile.clone());
        Ok(profile)
    }
}
