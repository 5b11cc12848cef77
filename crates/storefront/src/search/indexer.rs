//! Search index population.
//!
//! Fills the index from the commerce backend and the content database at
//! start-up, and keeps products current when product webhooks arrive.

use sqlx::PgPool;
use tracing::{error, info, instrument, warn};

use joy_junction_core::ProductDescription;

use crate::commerce::{CommerceClient, CommerceError, Product};
use crate::db::BlogRepository;
use crate::error::AppError;
use crate::models::Blog;

use super::{IndexType, SearchDocument, SearchError, SearchIndex};

/// Maximum length of the stored summary, in characters.
const SUMMARY_CHARS: usize = 200;

/// What a product sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Indexed,
    /// The product no longer exists upstream and was dropped from the index.
    Removed,
}

/// Spawn a background task that indexes every product and blog post.
///
/// Until it finishes, searches return whatever has been indexed so far.
pub fn spawn_initial_sync(index: SearchIndex, commerce: CommerceClient, pool: PgPool) {
    info!("Spawning background search index sync task");
    tokio::spawn(async move {
        let products = index_products(&index, &commerce).await;
        let blogs = index_blogs(&index, &pool).await;
        info!(
            products,
            blogs,
            docs = index.num_docs(),
            "Search index is now ready and serving requests"
        );
    });
}

/// Index all products from the commerce backend.
async fn index_products(index: &SearchIndex, commerce: &CommerceClient) -> usize {
    let products = match commerce.list_all_products().await {
        Ok(products) => products,
        Err(e) => {
            warn!(error = %e, "Failed to fetch products for indexing");
            return 0;
        }
    };

    let docs: Vec<SearchDocument> = products.iter().map(product_document).collect();
    match index.index_data(IndexType::Product, &docs) {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Failed to index products");
            0
        }
    }
}

/// Index all blog posts from the content database.
pub(crate) async fn index_blogs(index: &SearchIndex, pool: &PgPool) -> usize {
    let blogs = match BlogRepository::new(pool).list(None, None).await {
        Ok(blogs) => blogs,
        Err(e) => {
            warn!(error = %e, "Failed to fetch blogs for indexing");
            return 0;
        }
    };

    let docs: Vec<SearchDocument> = blogs.iter().map(blog_document).collect();
    match index.index_data(IndexType::Blog, &docs) {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Failed to index blogs");
            0
        }
    }
}

/// Re-fetch one product and upsert it, or drop it if it no longer exists.
///
/// # Errors
///
/// Returns `AppError::Commerce` if the backend call fails for any reason
/// other than the product being gone, or `AppError::Search` if the index
/// write fails.
#[instrument(skip(index, commerce))]
pub async fn sync_product(
    index: &SearchIndex,
    commerce: &CommerceClient,
    id: &str,
) -> Result<SyncOutcome, AppError> {
    // Handles may have changed; drop every cached product view
    commerce.invalidate_all().await;

    match commerce.get_product(id).await {
        Ok(product) => {
            index.index_data(IndexType::Product, &[product_document(&product)])?;
            Ok(SyncOutcome::Indexed)
        }
        Err(CommerceError::NotFound(_)) => {
            remove_product(index, id)?;
            Ok(SyncOutcome::Removed)
        }
        Err(e) => Err(e.into()),
    }
}

/// Drop a product from the index.
///
/// # Errors
///
/// Returns `SearchError::Index` if the index write fails.
pub fn remove_product(index: &SearchIndex, id: &str) -> Result<(), SearchError> {
    index.delete_from_index(IndexType::Product, &[id.to_string()])
}

/// Build the search document for a product.
#[must_use]
pub fn product_document(product: &Product) -> SearchDocument {
    let text = strip_html(product.description.as_deref().unwrap_or_default());
    let sections = ProductDescription::parse(&text);
    let summary = if sections.intro.is_empty() {
        product.subtitle.clone().unwrap_or_default()
    } else {
        sections.intro
    };

    SearchDocument {
        object_id: product.id.clone(),
        handle: product.handle.clone(),
        title: product.title.clone(),
        description: truncate(&summary, SUMMARY_CHARS),
        image_url: product.thumbnail.clone(),
        price: product.min_price().and_then(|price| {
            price.calculated_amount.map(|amount| {
                format!(
                    "{:.2} {}",
                    amount,
                    price.currency_code.as_deref().unwrap_or_default().to_uppercase()
                )
                .trim_end()
                .to_string()
            })
        }),
        tags: product.tags.iter().map(|t| t.value.clone()).collect(),
        body: format!("{} {text}", product.subtitle.as_deref().unwrap_or_default()),
    }
}

/// Build the search document for a blog post.
#[must_use]
pub fn blog_document(blog: &Blog) -> SearchDocument {
    SearchDocument {
        object_id: blog.id.to_string(),
        handle: blog.id.to_string(),
        title: blog.title.clone(),
        description: truncate(&blog.excerpt, SUMMARY_CHARS),
        image_url: Some(blog.image.clone()),
        price: None,
        tags: vec![blog.category.clone()],
        body: format!("{} {}", blog.author, strip_html(&blog.content)),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Strip HTML tags from a string.
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    // Decode common HTML entities
    result
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use joy_junction_core::Slug;
    use rust_decimal::Decimal;

    use super::*;
    use crate::commerce::{CalculatedPrice, ProductTag, ProductVariant};

    fn product() -> Product {
        Product {
            id: "prod_01".to_string(),
            handle: "rainbow-stacker".to_string(),
            title: "Rainbow Stacker".to_string(),
            subtitle: Some("Eight wooden rings".to_string()),
            description: Some(
                "<p>A classic first toy.</p> Cool things mastered with this: colours, \
                 sizes How to Play: Stack them up!"
                    .to_string(),
            ),
            thumbnail: Some("https://cdn.example.com/stacker.jpg".to_string()),
            tags: vec![ProductTag {
                id: "ptag_1".to_string(),
                value: "wooden".to_string(),
            }],
            variants: vec![ProductVariant {
                id: "var_1".to_string(),
                title: None,
                sku: None,
                calculated_price: Some(CalculatedPrice {
                    calculated_amount: Some(Decimal::new(899, 0)),
                    currency_code: Some("inr".to_string()),
                }),
            }],
        }
    }

    #[test]
    fn test_product_document_uses_intro_as_summary() {
        let doc = product_document(&product());
        assert_eq!(doc.object_id, "prod_01");
        assert_eq!(doc.description, "A classic first toy.");
        assert_eq!(doc.price.as_deref(), Some("899.00 INR"));
        assert_eq!(doc.tags, ["wooden"]);
        assert!(doc.body.contains("Stack them up!"));
    }

    #[test]
    fn test_product_without_description_falls_back_to_subtitle() {
        let mut product = product();
        product.description = None;
        product.variants.clear();

        let doc = product_document(&product);
        assert_eq!(doc.description, "Eight wooden rings");
        assert_eq!(doc.price, None);
    }

    #[test]
    fn test_blog_document() {
        let now = Utc::now();
        let blog = Blog {
            id: Slug::parse("screen-free-weekends").unwrap(),
            title: "Screen-free weekends".to_string(),
            published_at: now,
            category: "Parenting".to_string(),
            image: "/blog/weekends.jpg".to_string(),
            excerpt: "Ideas for slow weekends.".to_string(),
            content: "<h2>Start small</h2><p>Try a puzzle&nbsp;morning.</p>".to_string(),
            author: "Meera".to_string(),
            author_image: "/authors/meera.jpg".to_string(),
            created_at: now,
            updated_at: now,
        };

        let doc = blog_document(&blog);
        assert_eq!(doc.object_id, "screen-free-weekends");
        assert_eq!(doc.tags, ["Parenting"]);
        assert!(doc.body.contains("puzzle morning"));
        assert!(!doc.body.contains('<'));
    }

    #[test]
    fn test_remove_product() {
        let index = SearchIndex::new().unwrap();
        index
            .index_data(IndexType::Product, &[product_document(&product())])
            .unwrap();
        remove_product(&index, "prod_01").unwrap();
        assert_eq!(index.num_docs(), 0);
    }

    #[tokio::test]
    async fn test_sync_product_propagates_backend_failure() {
        let index = SearchIndex::new().unwrap();
        let commerce = CommerceClient::new(&crate::config::CommerceConfig {
            backend_url: "http://127.0.0.1:1".to_string(),
            publishable_key: "pk_test".to_string(),
        });

        let err = sync_product(&index, &commerce, "prod_01").await.unwrap_err();
        assert!(matches!(err, AppError::Commerce(CommerceError::Http(_))));
    }
}
