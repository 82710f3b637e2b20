//! The API Gateway: one outbound HTTP client for the whole SDK.
//!
//! Every request goes through [`ApiGateway::send`], which attaches the
//! session identity (bearer token when present, guest cart id as a fallback
//! signal) and centralizes the reaction to authorization failures: clear the
//! token, broadcast a session-expired event with a login redirect target, and
//! fail the call. The failing call is not retried.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use secrecy::ExposeSecret;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::identity::IdentityStore;
use crate::types::ErrorBody;

/// Header carrying the anonymous cart identifier.
pub const GUEST_ID_HEADER: &str = "X-Guest-ID";

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Session-level events broadcast by the gateway.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A previously valid token was rejected by the backend. The token has
    /// been cleared; the UI should take the user to `login_url`, which
    /// preserves the failing request's path as a return target.
    Expired { login_url: String },
}

/// Whether a request carries the session identity headers.
#[derive(Clone, Copy)]
enum IdentityMode {
    /// Attach bearer token and guest id (the default).
    Attach,
    /// No identity headers; used for the public auth endpoints.
    Skip,
}

/// Whether an authorization failure is announced to subscribers.
#[derive(Clone, Copy)]
enum ExpiryNotice {
    /// Broadcast a [`SessionEvent::Expired`]; the normal mid-session path.
    Notify,
    /// Clear the token quietly; used by the startup token probe.
    Silent,
}

struct ApiGatewayInner {
    http: reqwest::Client,
    api_root: String,
    identity: IdentityStore,
    events: broadcast::Sender<SessionEvent>,
}

/// Client for the Aba Market storefront API.
#[derive(Clone)]
pub struct ApiGateway {
    inner: Arc<ApiGatewayInner>,
}

impl ApiGateway {
    /// Create a new gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, identity: IdentityStore) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            inner: Arc::new(ApiGatewayInner {
                http,
                api_root: config.api_root(),
                identity,
                events,
            }),
        })
    }

    /// Subscribe to session events (expiry notifications).
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    // =========================================================================
    // Typed request helpers
    // =========================================================================

    /// GET a JSON resource.
    ///
    /// # Errors
    ///
    /// See [`ApiError`]; 404 maps to [`ApiError::NotFound`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .send(
                Method::GET,
                path,
                &[],
                None,
                IdentityMode::Attach,
                ExpiryNotice::Notify,
            )
            .await?;
        Ok(response.json().await?)
    }

    /// GET a JSON resource with query parameters.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .send(
                Method::GET,
                path,
                query,
                None,
                IdentityMode::Attach,
                ExpiryNotice::Notify,
            )
            .await?;
        Ok(response.json().await?)
    }

    /// GET without announcing an authorization failure. A rejected token is
    /// still cleared. Used by the startup token probe, which cleans up a
    /// stale session without a user-visible notice.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub(crate) async fn get_silent<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .send(
                Method::GET,
                path,
                &[],
                None,
                IdentityMode::Attach,
                ExpiryNotice::Silent,
            )
            .await?;
        Ok(response.json().await?)
    }

    /// POST a JSON body, expecting a JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let response = self
            .send(
                Method::POST,
                path,
                &[],
                Some(body),
                IdentityMode::Attach,
                ExpiryNotice::Notify,
            )
            .await?;
        Ok(response.json().await?)
    }

    /// POST to a public auth endpoint. No identity headers are attached and a
    /// 401 passes through as an ordinary status error (a login rejection is
    /// not a session expiry).
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post_public<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let response = self
            .send(
                Method::POST,
                path,
                &[],
                Some(body),
                IdentityMode::Skip,
                ExpiryNotice::Notify,
            )
            .await?;
        Ok(response.json().await?)
    }

    /// POST to a public auth endpoint, discarding the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn post_public_discard(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<(), ApiError> {
        let body = serde_json::to_value(body)?;
        self.send(
            Method::POST,
            path,
            &[],
            Some(body),
            IdentityMode::Skip,
            ExpiryNotice::Notify,
        )
        .await?;
        Ok(())
    }

    /// PUT a JSON body, expecting a JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let response = self
            .send(
                Method::PUT,
                path,
                &[],
                Some(body),
                IdentityMode::Attach,
                ExpiryNotice::Notify,
            )
            .await?;
        Ok(response.json().await?)
    }

    /// DELETE, expecting a JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .send(
                Method::DELETE,
                path,
                &[],
                None,
                IdentityMode::Attach,
                ExpiryNotice::Notify,
            )
            .await?;
        Ok(response.json().await?)
    }

    /// DELETE, discarding whatever the server responds with.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn delete_discard(&self, path: &str) -> Result<(), ApiError> {
        self.send(
            Method::DELETE,
            path,
            &[],
            None,
            IdentityMode::Attach,
            ExpiryNotice::Notify,
        )
        .await?;
        Ok(())
    }

    // =========================================================================
    // Request funnel
    // =========================================================================

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
        identity: IdentityMode,
        expiry: ExpiryNotice,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{path}", self.inner.api_root);
        let mut request = self.inner.http.request(method, &url);

        if !query.is_empty() {
            request = request.query(query);
        }

        let token = match identity {
            IdentityMode::Attach => self.inner.identity.token(),
            IdentityMode::Skip => None,
        };
        let token_present = token.is_some();

        if let IdentityMode::Attach = identity {
            if let Some(token) = &token {
                request = request.bearer_auth(token.expose_secret());
            }
            if let Some(guest_id) = self.guest_header(token_present) {
                request = request.header(GUEST_ID_HEADER, guest_id);
            }
        }

        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        // A 401 on an authenticated request means the token went stale.
        // Clearing it is a one-shot reaction per failing call; the call is
        // not retried.
        if status == StatusCode::UNAUTHORIZED && token_present {
            self.inner.identity.clear_token();
            match expiry {
                ExpiryNotice::Notify => {
                    let login_url = login_redirect(path);
                    warn!(path, "session expired; token cleared");
                    let _ = self
                        .inner
                        .events
                        .send(SessionEvent::Expired { login_url });
                }
                ExpiryNotice::Silent => {
                    debug!(path, "stale token cleared during silent probe");
                }
            }
            return Err(ApiError::SessionExpired);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message);
            return Err(ApiError::Status { status, message });
        }

        Ok(response)
    }

    /// The guest-id header value for a request.
    ///
    /// Without a token the id is created on first use, so every anonymous
    /// request carries one. With a token only a pre-existing id is attached
    /// (a defensive fallback the backend may use if the token proves
    /// invalid) - a fresh one is never minted, so after the post-login clear
    /// nothing is sent.
    fn guest_header(&self, token_present: bool) -> Option<String> {
        if token_present {
            self.inner.identity.guest_id()
        } else {
            Some(self.inner.identity.get_or_create_guest_id())
        }
    }
}

/// The login redirect target for a failed request path.
fn login_redirect(path: &str) -> String {
    format!("/login?redirect={}", urlencoding::encode(path))
}
