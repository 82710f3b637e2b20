//! Catalog browsing: products, product detail, search and the category tree.
//!
//! Catalog reads are public and change rarely, so listings, detail pages and
//! the category tree sit behind a short-lived in-memory cache. Search is
//! deliberately uncached; query strings fan out too widely to be worth the
//! memory.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::instrument;

use aba_market_core::ProductId;

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::types::{Category, Product};

const CACHE_TTL: Duration = Duration::from_secs(300);
const CACHE_CAPACITY: u64 = 1000;

#[derive(Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Arc<Product>),
    Categories(Arc<Vec<Category>>),
}

struct CatalogInner {
    gateway: ApiGateway,
    cache: Cache<String, CacheValue>,
}

/// Client for the public catalog endpoints.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

impl Catalog {
    /// Create a catalog client over the given gateway.
    #[must_use]
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                gateway,
                cache: Cache::builder()
                    .time_to_live(CACHE_TTL)
                    .max_capacity(CACHE_CAPACITY)
                    .build(),
            }),
        }
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        let key = "products".to_string();
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            return Ok(products);
        }

        let products: Arc<Vec<Product>> =
            Arc::new(self.inner.gateway.get("/products").await?);
        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// A single product by id.
    ///
    /// # Errors
    ///
    /// See [`ApiError`]; an unknown id yields [`ApiError::NotFound`].
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Arc<Product>, ApiError> {
        let key = format!("product:{id}");
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            return Ok(product);
        }

        let product: Arc<Product> = Arc::new(
            self.inner
                .gateway
                .get(&format!("/products/{id}"))
                .await?,
        );
        self.inner
            .cache
            .insert(key, CacheValue::Product(product.clone()))
            .await;
        Ok(product)
    }

    /// Full-text product search. Uncached.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        self.inner
            .gateway
            .get_query("/products/search", &[("q", query.to_string())])
            .await
    }

    /// The category tree, roots with nested children.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        let key = "categories".to_string();
        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&key).await {
            return Ok(categories);
        }

        let categories: Arc<Vec<Category>> =
            Arc::new(self.inner.gateway.get("/categories/tree").await?);
        self.inner
            .cache
            .insert(key, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Drop all cached catalog data.
    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
    }
}
