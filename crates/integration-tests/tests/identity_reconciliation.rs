//! Guest identity lifecycle against the mock backend: minted once, reused on
//! every anonymous request, handed to the backend at login for the cart
//! merge, then gone.

use aba_market_client::Credentials;
use aba_market_core::VariantId;
use aba_market_integration_tests::{TEST_EMAIL, TEST_PASSWORD, TOTE_VARIANT, TestContext};

fn credentials() -> Credentials {
    Credentials {
        username: TEST_EMAIL.to_string(),
        password: TEST_PASSWORD.to_string(),
    }
}

// ============================================================================
// Anonymous browsing
// ============================================================================

#[tokio::test]
async fn test_guest_id_minted_once_and_reused() {
    let ctx = TestContext::start().await;

    ctx.client.cart().fetch().await;
    ctx.client.cart().fetch().await;

    let requests = ctx.backend.requests_for("/api/v1/cart");
    assert_eq!(requests.len(), 2);

    let first = requests
        .first()
        .and_then(|r| r.guest_id.clone())
        .expect("guest id on first request");
    let second = requests
        .get(1)
        .and_then(|r| r.guest_id.clone())
        .expect("guest id on second request");
    assert_eq!(first, second);
    assert!(requests.iter().all(|r| r.bearer.is_none()));
}

// ============================================================================
// Login reconciliation
// ============================================================================

#[tokio::test]
async fn test_login_merges_guest_cart_and_drops_guest_id() {
    let ctx = TestContext::start().await;

    // Build up a guest cart: 2 x ₦2,500.
    let cart = ctx
        .client
        .cart()
        .add_item(VariantId::new(TOTE_VARIANT), 2)
        .await
        .expect("guest add");
    assert_eq!(cart.item_count(), 2);

    let profile = ctx.client.auth().login(&credentials()).await.expect("login");
    assert_eq!(profile.email, TEST_EMAIL);

    // The merged cart came back with the post-login refresh.
    assert_eq!(ctx.client.cart().item_count(), 2);
    assert_eq!(ctx.client.cart().total().display(), "₦5,000");

    // The guest id is spent.
    assert!(ctx.client.identity().guest_id().is_none());

    // The login call itself carried no identity headers.
    let login_requests = ctx.backend.requests_for("/api/v1/auth/login");
    assert_eq!(login_requests.len(), 1);
    let login_request = login_requests.first().expect("login request");
    assert!(login_request.guest_id.is_none());
    assert!(login_request.bearer.is_none());

    // Requests after login are authenticated and guest-id free.
    let cart_requests = ctx.backend.requests_for("/api/v1/cart");
    let last = cart_requests.last().expect("post-login cart fetch");
    assert!(last.bearer.is_some());
    assert!(last.guest_id.is_none());
}

#[tokio::test]
async fn test_fresh_guest_id_after_session_expiry() {
    let ctx = TestContext::start().await;

    ctx.client.cart().fetch().await;
    let requests = ctx.backend.requests_for("/api/v1/cart");
    let original = requests
        .first()
        .and_then(|r| r.guest_id.clone())
        .expect("guest id");

    ctx.client.auth().login(&credentials()).await.expect("login");
    ctx.backend.revoke_all_tokens();

    // The 401 clears the token; the session is anonymous again.
    ctx.client.cart().fetch().await;
    assert!(ctx.client.identity().token().is_none());

    // The next anonymous request mints a brand-new guest id.
    ctx.client.cart().fetch().await;
    let requests = ctx.backend.requests_for("/api/v1/cart");
    let latest = requests
        .last()
        .and_then(|r| r.guest_id.clone())
        .expect("fresh guest id");
    assert_ne!(latest, original);
}
