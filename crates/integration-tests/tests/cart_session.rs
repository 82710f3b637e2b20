//! Cart behavior against the mock backend: the server owns the cart, the
//! client displays what it last received.

use aba_market_client::{CartError, CartState};
use aba_market_core::VariantId;
use aba_market_integration_tests::{SANDALS_VARIANT, TOTE_VARIANT, TestContext};

#[tokio::test]
async fn test_missing_cart_is_empty_not_an_error() {
    let ctx = TestContext::start().await;

    // The backend answers 404 for a session with no cart yet.
    ctx.client.cart().fetch().await;

    assert!(matches!(ctx.client.cart().state(), CartState::Empty));
    assert_eq!(ctx.client.cart().item_count(), 0);
}

#[tokio::test]
async fn test_add_replaces_cart_with_server_response() {
    let ctx = TestContext::start().await;

    let cart = ctx
        .client
        .cart()
        .add_item(VariantId::new(TOTE_VARIANT), 2)
        .await
        .expect("add to cart");

    // 2 x ₦2,500, computed by the backend.
    assert_eq!(cart.item_count(), 2);
    assert_eq!(cart.total_price().display(), "₦5,000");
    assert!(matches!(ctx.client.cart().state(), CartState::Loaded(_)));
    assert_eq!(ctx.client.cart().total().display(), "₦5,000");
}

#[tokio::test]
async fn test_add_rejection_surfaces_backend_message() {
    let ctx = TestContext::start().await;

    let result = ctx.client.cart().add_item(VariantId::new(999), 1).await;

    match result {
        Err(CartError::Rejected(message)) => {
            assert_eq!(message, "Unknown product variant");
        }
        other => panic!("expected rejection, got {other:?}"),
    }

    // The local cart is untouched by the failed mutation.
    assert_eq!(ctx.client.cart().item_count(), 0);
}

#[tokio::test]
async fn test_remove_item() {
    let ctx = TestContext::start().await;

    ctx.client
        .cart()
        .add_item(VariantId::new(TOTE_VARIANT), 1)
        .await
        .expect("add tote");
    ctx.client
        .cart()
        .add_item(VariantId::new(SANDALS_VARIANT), 1)
        .await
        .expect("add sandals");
    assert_eq!(ctx.client.cart().item_count(), 2);

    ctx.client
        .cart()
        .remove_item(VariantId::new(TOTE_VARIANT))
        .await;

    assert_eq!(ctx.client.cart().item_count(), 1);
    assert_eq!(ctx.client.cart().total().display(), "₦4,500");
}

#[tokio::test]
async fn test_removing_last_item_leaves_empty_cart() {
    let ctx = TestContext::start().await;

    ctx.client
        .cart()
        .add_item(VariantId::new(TOTE_VARIANT), 2)
        .await
        .expect("add to cart");
    assert_eq!(ctx.client.cart().item_count(), 2);

    ctx.client
        .cart()
        .remove_item(VariantId::new(TOTE_VARIANT))
        .await;

    // The server's cart still exists but has no lines; the presentation is
    // the empty-cart view.
    assert_eq!(ctx.client.cart().item_count(), 0);
    assert_eq!(ctx.client.cart().total().display(), "₦0");
    let state = ctx.client.cart().state();
    assert!(state.cart().is_none_or(|cart| cart.items.is_empty()));
}

#[tokio::test]
async fn test_clear_cart() {
    let ctx = TestContext::start().await;

    ctx.client
        .cart()
        .add_item(VariantId::new(TOTE_VARIANT), 3)
        .await
        .expect("add to cart");
    assert_eq!(ctx.client.cart().item_count(), 3);

    ctx.client.cart().clear().await;
    assert!(matches!(ctx.client.cart().state(), CartState::Empty));

    // The backend agrees the cart is gone.
    ctx.client.cart().fetch().await;
    assert!(matches!(ctx.client.cart().state(), CartState::Empty));
}
