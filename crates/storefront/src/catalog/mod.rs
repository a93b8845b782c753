//! Cached read access to the product catalog.
//!
//! Products are cached with `moka` for a short TTL (`CATALOG_CACHE_TTL_SECS`).
//! Reviews are never cached so a freshly approved review shows up at once.

pub mod listing;

use std::sync::Arc;
use std::time::Duration;

use digimart_core::ProductId;
use digimart_supabase::types::{Product, Review};
use digimart_supabase::{GatewayClient, GatewayError, Select};
use moka::future::Cache;
use tracing::{debug, instrument};

pub use listing::{CatalogFilter, HomeSections, SortKey};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
}

/// Catalog reader over the `products` and `reviews` tables.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    gateway: GatewayClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    #[must_use]
    pub fn new(gateway: GatewayClient, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CatalogInner { gateway, cache }),
        }
    }

    /// Every product in catalog order (oldest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway request fails or a row is invalid.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, GatewayError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Arc<Vec<Product>> = Arc::new(
            self.inner
                .gateway
                .select(&Select::new().order_asc("created_at"))
                .await?,
        );

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if there is no such product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, GatewayError> {
        let key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.inner.gateway.find(id).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Approved reviews for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn approved_reviews(&self, id: ProductId) -> Result<Vec<Review>, GatewayError> {
        self.inner
            .gateway
            .select(
                &Select::newest()
                    .eq("product_id", id)
                    .eq("is_approved", true),
            )
            .await
    }
}
