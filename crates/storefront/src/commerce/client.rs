//! Store API client implementation.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::CommerceError;
use super::cache::{CacheKey, CacheValue};
use super::types::{Product, ProductEnvelope, ProductPage};
use crate::config::CommerceConfig;

/// Header carrying the sales-channel publishable key.
const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";

/// Client for the commerce backend's store API.
///
/// Products are cached for 5 minutes.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    publishable_key: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl CommerceClient {
    /// Create a new store API client.
    #[must_use]
    pub fn new(config: &CommerceConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CommerceClientInner {
                client: reqwest::Client::new(),
                base_url: config.backend_url.clone(),
                publishable_key: config.publishable_key.clone(),
                cache,
            }),
        }
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        self.inner
            .client
            .get(format!("{}{path}", self.inner.base_url))
            .header(PUBLISHABLE_KEY_HEADER, &self.inner.publishable_key)
    }

    /// Send a request and decode the JSON body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CommerceError> {
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        // Read as text first for better error diagnostics
        let response_text = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CommerceError::NotFound("Product".to_string()));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Commerce API returned non-success status"
            );
            return Err(CommerceError::Api {
                status: status.as_u16(),
                message: response_text.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse commerce API response"
            );
            CommerceError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if no product has this handle, or
    /// another error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, CommerceError> {
        let cache_key = CacheKey::Handle(handle.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = format!(
            "/store/products?handle={}&limit=1",
            urlencoding::encode(handle)
        );
        let page: ProductPage = self.execute(self.request(&path)).await?;

        let product = page
            .products
            .into_iter()
            .find(|p| p.handle == handle)
            .ok_or_else(|| CommerceError::NotFound("Product".to_string()))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a product by its backend id.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if the product does not exist, or
    /// another error if the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: &str) -> Result<Product, CommerceError> {
        let cache_key = CacheKey::Id(id.to_string());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = format!("/store/products/{}", urlencoding::encode(id));
        let envelope: ProductEnvelope = self.execute(self.request(&path)).await?;

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Product(Box::new(envelope.product.clone())),
            )
            .await;

        Ok(envelope.product)
    }

    /// Get one page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, limit: u32, offset: u32) -> Result<ProductPage, CommerceError> {
        let cache_key = CacheKey::Page { limit, offset };

        if let Some(CacheValue::Page(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let path = format!("/store/products?limit={limit}&offset={offset}");
        let page: ProductPage = self.execute(self.request(&path)).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Page(page.clone()))
            .await;

        Ok(page)
    }

    /// Fetch every product, page by page.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    pub async fn list_all_products(&self) -> Result<Vec<Product>, CommerceError> {
        const PAGE_SIZE: u32 = 100;

        let mut products = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.list_products(PAGE_SIZE, offset).await?;
            let fetched = u32::try_from(page.products.len()).unwrap_or(u32::MAX);
            products.extend(page.products);
            offset = offset.saturating_add(fetched);
            if fetched == 0 || offset >= page.count {
                break;
            }
        }
        Ok(products)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Drop every cached product and page.
    ///
    /// Product webhooks call this; handles can change, so per-key
    /// invalidation would miss stale handle entries.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> CommerceClient {
        CommerceClient::new(&CommerceConfig {
            backend_url: "http://commerce:9000".to_string(),
            publishable_key: "pk_test_123".to_string(),
        })
    }

    #[test]
    fn test_request_sends_publishable_key() {
        let request = client()
            .request("/store/products?handle=wooden-stacker")
            .build()
            .unwrap();

        assert_eq!(request.headers()[PUBLISHABLE_KEY_HEADER], "pk_test_123");
        assert_eq!(
            request.url().as_str(),
            "http://commerce:9000/store/products?handle=wooden-stacker"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_http_error() {
        let client = CommerceClient::new(&CommerceConfig {
            backend_url: "http://127.0.0.1:1".to_string(),
            publishable_key: "pk_test".to_string(),
        });
        let err = client.get_product_by_handle("anything").await.unwrap_err();
        assert!(matches!(err, CommerceError::Http(_)));
    }
}
