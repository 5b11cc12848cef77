//! Tag-invalidated read-through cache for content queries.
//!
//! Repository reads are cached in `moka` for the configured revalidate
//! window. Each entry is recorded under one or more content tags so that a
//! revalidation request for e.g. `blogs` drops every cached blog listing and
//! post at once, without waiting for the TTL.

pub mod tags;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use moka::notification::RemovalCause;
use tracing::debug;

use joy_junction_core::Slug;

use crate::models::{Blog, HeroSlide, Offer, Testimonial};

/// Cache key for content queries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Blogs {
        category: Option<String>,
        limit: Option<i64>,
    },
    Blog(Slug),
    BlogCategories,
    HeroSlides {
        mobile: Option<bool>,
    },
    Testimonials {
        featured_only: bool,
    },
    Offers,
}

/// Cached value types.
///
/// A missing blog post is cached as `Blog(None)` so repeated lookups of an
/// unknown slug don't hit the database until the next revalidation.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Blogs(Arc<Vec<Blog>>),
    Blog(Option<Arc<Blog>>),
    BlogCategories(Arc<Vec<String>>),
    HeroSlides(Arc<Vec<HeroSlide>>),
    Testimonials(Arc<Vec<Testimonial>>),
    Offers(Arc<Vec<Offer>>),
}

/// Conversion between a typed query result and its [`CacheValue`] variant.
pub trait Cacheable: Sized {
    fn into_value(self) -> CacheValue;
    fn from_value(value: CacheValue) -> Option<Self>;
}

macro_rules! impl_cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_value(self) -> CacheValue {
                CacheValue::$variant(self)
            }

            fn from_value(value: CacheValue) -> Option<Self> {
                match value {
                    CacheValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_cacheable!(Arc<Vec<Blog>>, Blogs);
impl_cacheable!(Option<Arc<Blog>>, Blog);
impl_cacheable!(Arc<Vec<String>>, BlogCategories);
impl_cacheable!(Arc<Vec<HeroSlide>>, HeroSlides);
impl_cacheable!(Arc<Vec<Testimonial>>, Testimonials);
impl_cacheable!(Arc<Vec<Offer>>, Offers);

/// A cached value with the tags it was recorded under.
///
/// `stamp` is unique per insert, so removing a replaced or expired entry
/// never unlinks a newer value stored under the same key.
#[derive(Debug, Clone)]
struct Entry {
    value: CacheValue,
    tags: Arc<[String]>,
    stamp: u64,
}

/// Tag name to the keys recorded under it, with the stamp of each insert.
type TagIndex = HashMap<String, HashMap<CacheKey, u64>>;

/// Read-through content cache with tag invalidation.
#[derive(Clone)]
pub struct ContentCache {
    inner: Arc<ContentCacheInner>,
}

struct ContentCacheInner {
    entries: Cache<CacheKey, Entry>,
    tag_index: Arc<Mutex<TagIndex>>,
    /// Bumped on every invalidation; a load that straddles one is not kept.
    generation: AtomicU64,
    next_stamp: AtomicU64,
}

fn lock(index: &Mutex<TagIndex>) -> MutexGuard<'_, TagIndex> {
    index.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Remove `key` from every tag it was recorded under by the insert `stamp`.
fn unlink(index: &Mutex<TagIndex>, key: &CacheKey, tags: &[String], stamp: u64) {
    let mut index = lock(index);
    for tag in tags {
        if let Some(keys) = index.get_mut(tag) {
            if keys.get(key) == Some(&stamp) {
                keys.remove(key);
            }
            if keys.is_empty() {
                index.remove(tag);
            }
        }
    }
}

impl ContentCache {
    /// Create a cache whose entries live for `ttl` unless invalidated first.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let tag_index = Arc::new(Mutex::new(TagIndex::new()));

        let listener_index = Arc::clone(&tag_index);
        let entries = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .eviction_listener(move |key: Arc<CacheKey>, entry: Entry, _cause: RemovalCause| {
                unlink(&listener_index, &key, &entry.tags, entry.stamp);
            })
            .build();

        Self {
            inner: Arc::new(ContentCacheInner {
                entries,
                tag_index,
                generation: AtomicU64::new(0),
                next_stamp: AtomicU64::new(0),
            }),
        }
    }

    /// Return the cached value for `key`, or run `load` and cache its result
    /// under `tags`.
    ///
    /// Loader errors are returned as-is and never cached.
    ///
    /// # Errors
    ///
    /// Returns whatever `load` returns on failure.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        key: CacheKey,
        tags: &[String],
        load: F,
    ) -> Result<T, E>
    where
        T: Cacheable + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self
            .inner
            .entries
            .get(&key)
            .await
            .and_then(|entry| T::from_value(entry.value))
        {
            debug!(key = ?key, "Content cache hit");
            return Ok(cached);
        }

        let generation = self.inner.generation.load(Ordering::Acquire);
        let value = load().await?;
        self.store(key, tags, value.clone().into_value(), generation)
            .await;

        Ok(value)
    }

    /// Insert `value` and record it under `tags`, then drop it again if an
    /// invalidation ran since `generation` was read.
    ///
    /// `invalidate_tags` bumps the generation before it reads the tag index,
    /// so either it sees this key in the index or the re-check sees the bump.
    async fn store(&self, key: CacheKey, tags: &[String], value: CacheValue, generation: u64) {
        let stamp = self.inner.next_stamp.fetch_add(1, Ordering::Relaxed);
        let entry = Entry {
            value,
            tags: tags.into(),
            stamp,
        };

        self.inner.entries.insert(key.clone(), entry).await;
        {
            let mut index = lock(&self.inner.tag_index);
            for tag in tags {
                index.entry(tag.clone()).or_default().insert(key.clone(), stamp);
            }
        }

        if self.inner.generation.load(Ordering::Acquire) != generation {
            debug!(key = ?key, "Invalidation during load, not caching");
            self.inner.entries.invalidate(&key).await;
            unlink(&self.inner.tag_index, &key, tags, stamp);
        }
    }

    /// Drop every entry recorded under any of `tags`.
    ///
    /// Returns the number of keys invalidated.
    pub async fn invalidate_tags(&self, tags: &[String]) -> usize {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);

        let keys: HashSet<CacheKey> = {
            let mut index = lock(&self.inner.tag_index);
            tags.iter()
                .filter_map(|tag| index.remove(tag))
                .flat_map(HashMap::into_keys)
                .collect()
        };

        for key in &keys {
            self.inner.entries.invalidate(key).await;
        }

        debug!(tags = ?tags, invalidated = keys.len(), "Content cache invalidated");
        keys.len()
    }

    #[cfg(test)]
    fn indexed_keys(&self) -> usize {
        lock(&self.inner.tag_index).values().map(HashMap::len).sum()
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn cache() -> ContentCache {
        ContentCache::new(Duration::from_secs(60))
    }

    fn tag_list(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    async fn load_categories(
        cache: &ContentCache,
        calls: &AtomicUsize,
    ) -> Arc<Vec<String>> {
        cache
            .get_or_load(CacheKey::BlogCategories, &tag_list(&[tags::BLOGS]), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(Arc::new(vec!["play".to_string()]))
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        let first = load_categories(&cache, &calls).await;
        let second = load_categories(&cache, &calls).await;

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_tag_forces_reload() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        load_categories(&cache, &calls).await;
        assert_eq!(cache.invalidate_tags(&tag_list(&[tags::BLOGS])).await, 1);
        load_categories(&cache, &calls).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unrelated_tag_keeps_entry() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        load_categories(&cache, &calls).await;
        assert_eq!(cache.invalidate_tags(&tag_list(&[tags::OFFERS])).await, 0);
        load_categories(&cache, &calls).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_blog_is_cached_as_none() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let slug = Slug::parse("no-such-post").unwrap();
        let post_tags = vec![tags::BLOGS.to_string(), tags::blog("no-such-post")];

        for _ in 0..2 {
            let found: Option<Arc<Blog>> = cache
                .get_or_load(CacheKey::Blog(slug.clone()), &post_tags, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(None)
                })
                .await
                .unwrap();
            assert!(found.is_none());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache
            .invalidate_tags(&[tags::blog("no-such-post")])
            .await;
        let _: Option<Arc<Blog>> = cache
            .get_or_load(CacheKey::Blog(slug), &post_tags, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(None)
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_loader_error_is_not_cached() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        let result: Result<Arc<Vec<Offer>>, &str> = cache
            .get_or_load(CacheKey::Offers, &tag_list(&[tags::OFFERS]), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("database down")
            })
            .await;
        assert_eq!(result.unwrap_err(), "database down");

        let result: Result<Arc<Vec<Offer>>, &str> = cache
            .get_or_load(CacheKey::Offers, &tag_list(&[tags::OFFERS]), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Vec::new()))
            })
            .await;
        assert!(result.unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidation_during_load_skips_insert() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let offer_tags = tag_list(&[tags::OFFERS]);

        let _: Arc<Vec<Offer>> = cache
            .get_or_load(CacheKey::Offers, &offer_tags, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                cache.invalidate_tags(&offer_tags).await;
                Ok::<_, ()>(Arc::new(Vec::new()))
            })
            .await
            .unwrap();

        let _: Arc<Vec<Offer>> = cache
            .get_or_load(CacheKey::Offers, &offer_tags, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(Arc::new(Vec::new()))
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidation_after_insert_drops_entry() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        let offer_tags = tag_list(&[tags::OFFERS]);

        // A load that read the generation before a revalidation landed.
        let generation = cache.inner.generation.load(Ordering::Acquire);
        cache.invalidate_tags(&offer_tags).await;
        cache
            .store(
                CacheKey::Offers,
                &offer_tags,
                Arc::new(Vec::<Offer>::new()).into_value(),
                generation,
            )
            .await;
        cache.inner.entries.run_pending_tasks().await;

        assert!(cache.inner.entries.get(&CacheKey::Offers).await.is_none());
        assert_eq!(cache.indexed_keys(), 0);

        let _: Arc<Vec<Offer>> = cache
            .get_or_load(CacheKey::Offers, &offer_tags, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(Arc::new(Vec::new()))
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.invalidate_tags(&offer_tags).await, 1);
    }

    #[tokio::test]
    async fn test_expired_entries_leave_tag_index() {
        let cache = ContentCache::new(Duration::from_millis(10));

        for n in 0..50 {
            let name = format!("missing-post-{n}");
            let slug = Slug::parse(&name).unwrap();
            let post_tags = vec![tags::BLOGS.to_string(), tags::blog(&name)];
            let _: Option<Arc<Blog>> = cache
                .get_or_load(CacheKey::Blog(slug), &post_tags, || async {
                    Ok::<_, ()>(None)
                })
                .await
                .unwrap();
        }
        assert_eq!(cache.indexed_keys(), 100);

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.inner.entries.run_pending_tasks().await;

        assert_eq!(cache.indexed_keys(), 0);
        assert!(lock(&cache.inner.tag_index).is_empty());
    }

    #[tokio::test]
    async fn test_replaced_entry_stays_indexed() {
        let cache = cache();
        let offer_tags = tag_list(&[tags::OFFERS]);

        for _ in 0..2 {
            let generation = cache.inner.generation.load(Ordering::Acquire);
            cache
                .store(
                    CacheKey::Offers,
                    &offer_tags,
                    Arc::new(Vec::<Offer>::new()).into_value(),
                    generation,
                )
                .await;
        }
        cache.inner.entries.run_pending_tasks().await;

        assert_eq!(cache.indexed_keys(), 1);
        assert_eq!(cache.invalidate_tags(&offer_tags).await, 1);
    }
}
