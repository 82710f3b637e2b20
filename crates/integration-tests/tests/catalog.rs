//! Catalog browsing against the mock backend, including the read cache.

use aba_market_client::ApiError;
use aba_market_core::ProductId;
use aba_market_integration_tests::{TOTE_VARIANT, TestContext};

#[tokio::test]
async fn test_list_products() {
    let ctx = TestContext::start().await;

    let products = ctx.client.catalog().products().await.expect("products");
    assert_eq!(products.len(), 2);
    assert!(products.iter().any(|p| p.name == "Ankara Tote Bag"));
}

#[tokio::test]
async fn test_product_detail_includes_variants() {
    let ctx = TestContext::start().await;

    let product = ctx
        .client
        .catalog()
        .product(ProductId::new(1))
        .await
        .expect("product");
    assert_eq!(product.name, "Ankara Tote Bag");
    assert!(
        product
            .variants
            .iter()
            .any(|v| v.id == aba_market_core::VariantId::new(TOTE_VARIANT))
    );
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::start().await;

    let err = ctx
        .client
        .catalog()
        .product(ProductId::new(999))
        .await
        .expect_err("missing product");
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_search_filters_by_name() {
    let ctx = TestContext::start().await;

    let hits = ctx.client.catalog().search("sandals").await.expect("search");
    assert_eq!(hits.len(), 1);
    let hit = hits.first().expect("hit");
    assert_eq!(hit.name, "Aba Leather Sandals");

    let none = ctx.client.catalog().search("gramophone").await.expect("search");
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_category_tree_is_nested() {
    let ctx = TestContext::start().await;

    let tree = ctx.client.catalog().categories().await.expect("categories");
    assert_eq!(tree.len(), 2);

    let fashion = tree.iter().find(|c| c.name == "Fashion").expect("fashion root");
    assert_eq!(fashion.children.len(), 2);
    assert!(fashion.children.iter().any(|c| c.name == "Footwear"));
}

#[tokio::test]
async fn test_product_listing_is_cached() {
    let ctx = TestContext::start().await;

    let first = ctx.client.catalog().products().await.expect("products");
    let second = ctx.client.catalog().products().await.expect("products");
    assert_eq!(first.len(), second.len());

    // The second call was served from cache.
    assert_eq!(ctx.backend.requests_for("/api/products").len(), 1);

    ctx.client.catalog().invalidate_all();
    ctx.client.catalog().products().await.expect("products");
    assert_eq!(ctx.backend.requests_for("/api/products").len(), 2);
}
