//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::ContentCache;
use crate::commerce::CommerceClient;
use crate::config::StorefrontConfig;
use crate::middleware::FixedWindowLimiter;
use crate::search::{SearchError, SearchIndex};
use crate::services::{EmailService, RevalidationClient};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    cache: ContentCache,
    commerce: CommerceClient,
    search: SearchIndex,
    revalidator: RevalidationClient,
    email: Option<EmailService>,
    newsletter_limiter: FixedWindowLimiter,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the search index cannot be created.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, SearchError> {
        let cache = ContentCache::new(config.content_cache_ttl);
        let commerce = CommerceClient::new(&config.commerce);
        let search = SearchIndex::new()?;
        let revalidator = RevalidationClient::new(&config.revalidation);
        let email = config.email.as_ref().map(EmailService::new);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cache,
                commerce,
                search,
                revalidator,
                email,
                newsletter_limiter: FixedWindowLimiter::newsletter(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn cache(&self) -> &ContentCache {
        &self.inner.cache
    }

    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    #[must_use]
    pub fn search(&self) -> &SearchIndex {
        &self.inner.search
    }

    #[must_use]
    pub fn revalidator(&self) -> &RevalidationClient {
        &self.inner.revalidator
    }

    /// Email service, if an API key is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    #[must_use]
    pub fn newsletter_limiter(&self) -> &FixedWindowLimiter {
        &self.inner.newsletter_limiter
    }
}
