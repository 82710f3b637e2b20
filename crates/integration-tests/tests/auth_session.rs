//! Auth flows against the mock backend: uniform login rejection, session
//! expiry mid-call, silent restore and logout.

use aba_market_client::{
    ApiError, AuthError, ClientConfig, Credentials, IdentityStore, MemoryStorage, NewAccount,
    SessionEvent, StoreClient,
};
use aba_market_integration_tests::{TEST_EMAIL, TEST_PASSWORD, TestContext};
use tokio::sync::broadcast::error::TryRecvError;
use url::Url;

fn credentials() -> Credentials {
    Credentials {
        username: TEST_EMAIL.to_string(),
        password: TEST_PASSWORD.to_string(),
    }
}

/// A client whose backend refuses connections: bind an ephemeral port, note
/// it, drop the listener.
async fn unreachable_client(identity: IdentityStore) -> StoreClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let config = ClientConfig::new(Url::parse(&format!("http://{addr}/api")).expect("url"));
    StoreClient::with_identity(&config, identity).expect("build client")
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_rejection_is_uniform() {
    let ctx = TestContext::start().await;

    let wrong = Credentials {
        username: TEST_EMAIL.to_string(),
        password: "wrong".to_string(),
    };
    let err = ctx.client.auth().login(&wrong).await.expect_err("bad login");

    // The backend sent a field-specific message; the client must not relay it.
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(ctx.client.auth().profile().is_none());
    assert!(ctx.client.identity().token().is_none());
}

#[tokio::test]
async fn test_successful_login_yields_profile() {
    let ctx = TestContext::start().await;

    let profile = ctx.client.auth().login(&credentials()).await.expect("login");
    assert_eq!(profile.display_name(), "Ada Obi");
    assert!(ctx.client.auth().state().is_authenticated());
    assert!(ctx.client.identity().token().is_some());
}

#[tokio::test]
async fn test_login_distinguishes_unreachable_backend() {
    let client = unreachable_client(IdentityStore::open(MemoryStorage::default())).await;

    let err = client
        .auth()
        .login(&credentials())
        .await
        .expect_err("no backend");

    // A connection failure is not a credential rejection.
    assert!(matches!(err, AuthError::Unavailable));
    assert_ne!(err.to_string(), "Invalid email or password");
    assert!(client.auth().profile().is_none());
}

// ============================================================================
// Expiry
// ============================================================================

#[tokio::test]
async fn test_expired_session_clears_token_and_announces_redirect() {
    let ctx = TestContext::start().await;
    ctx.client.auth().login(&credentials()).await.expect("login");

    let mut events = ctx.client.subscribe();
    ctx.backend.revoke_all_tokens();

    let err = ctx
        .client
        .account()
        .current_user()
        .await
        .expect_err("expired call");
    assert!(matches!(err, ApiError::SessionExpired));
    assert!(ctx.client.identity().token().is_none());

    let SessionEvent::Expired { login_url } = events.recv().await.expect("expiry event");
    assert_eq!(login_url, "/login?redirect=%2Fv1%2Fusers%2Fme");
}

#[tokio::test]
async fn test_restore_with_valid_token() {
    let ctx = TestContext::start().await;
    ctx.client.auth().login(&credentials()).await.expect("login");

    // A fresh client over the same persisted identity, as after a restart.
    let reopened = ctx.reopened_client();
    assert!(reopened.auth().profile().is_none());

    reopened.auth().restore().await;
    let profile = reopened.auth().profile().expect("restored profile");
    assert_eq!(profile.email, TEST_EMAIL);
}

#[tokio::test]
async fn test_restore_with_stale_token_is_silent() {
    let ctx = TestContext::start().await;
    ctx.client.auth().login(&credentials()).await.expect("login");
    ctx.backend.revoke_all_tokens();

    let reopened = ctx.reopened_client();
    let mut events = reopened.subscribe();

    reopened.auth().restore().await;

    // The stale token is cleaned up without a session-expired announcement.
    assert!(reopened.auth().profile().is_none());
    assert!(reopened.identity().token().is_none());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_restore_failure_drops_unconfirmed_token() {
    // Backend unreachable, so the probe fails without ever seeing a 401.
    let identity = IdentityStore::open(MemoryStorage::default());
    identity.set_token("tok-unconfirmed");
    let client = unreachable_client(identity.clone()).await;
    let mut events = client.subscribe();

    client.auth().restore().await;

    // The unconfirmed token is dropped with the state, never kept behind a
    // signed-out session, and still without an expiry announcement.
    assert!(client.auth().profile().is_none());
    assert!(identity.token().is_none());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

// ============================================================================
// Logout & signup
// ============================================================================

#[tokio::test]
async fn test_logout_returns_to_anonymous_browsing() {
    let ctx = TestContext::start().await;
    ctx.client.auth().login(&credentials()).await.expect("login");

    ctx.client.auth().logout().await;

    assert!(ctx.client.auth().profile().is_none());
    assert!(ctx.client.identity().token().is_none());

    // Browsing continues as a guest, with a fresh guest id and no bearer.
    ctx.client.cart().fetch().await;
    let last = ctx
        .backend
        .requests_for("/api/v1/cart")
        .last()
        .cloned()
        .expect("post-logout cart fetch");
    assert!(last.bearer.is_none());
    assert!(last.guest_id.is_some());
}

#[tokio::test]
async fn test_authenticated_call_after_logout_fails_plainly() {
    let ctx = TestContext::start().await;
    ctx.client.auth().login(&credentials()).await.expect("login");
    ctx.client.auth().logout().await;

    let mut events = ctx.client.subscribe();
    let err = ctx
        .client
        .orders()
        .history(0, 10)
        .await
        .expect_err("no session");

    // No token was sent, so this is an ordinary rejection, not an expiry.
    match err {
        ApiError::Status { status, .. } => assert_eq!(status.as_u16(), 401),
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_signup_then_login() {
    let ctx = TestContext::start().await;

    let account = NewAccount {
        first_name: "Chidi".to_string(),
        last_name: "Eze".to_string(),
        email: "chidi@example.com".to_string(),
        password: "pw12345".to_string(),
    };
    ctx.client.auth().signup(&account).await.expect("signup");

    // Signup alone does not sign the user in.
    assert!(ctx.client.auth().profile().is_none());

    let profile = ctx
        .client
        .auth()
        .login(&Credentials {
            username: account.email.clone(),
            password: account.password.clone(),
        })
        .await
        .expect("login as new account");
    assert_eq!(profile.email, "chidi@example.com");
}

#[tokio::test]
async fn test_signup_duplicate_email_surfaces_backend_message() {
    let ctx = TestContext::start().await;

    let account = NewAccount {
        first_name: "Ada".to_string(),
        last_name: "Obi".to_string(),
        email: TEST_EMAIL.to_string(),
        password: "pw12345".to_string(),
    };
    let err = ctx
        .client
        .auth()
        .signup(&account)
        .await
        .expect_err("duplicate signup");

    match err {
        AuthError::Registration(message) => assert_eq!(message, "Email already in use"),
        other => panic!("expected registration error, got {other:?}"),
    }
}
