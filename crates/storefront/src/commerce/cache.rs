//! Cache types for store API responses.

use super::types::{Product, ProductPage};

/// Cache key for products.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Handle(String),
    Id(String),
    Page { limit: u32, offset: u32 },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Page(ProductPage),
}
