//! Product types returned by the store API.
//!
//! Only the fields the storefront service reads are modelled; unknown fields
//! are ignored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Free text; may embed "Cool things mastered with this:" and
    /// "How to Play:" sections.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub tags: Vec<ProductTag>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Lowest calculated variant price, if the backend priced any variant.
    #[must_use]
    pub fn min_price(&self) -> Option<&CalculatedPrice> {
        self.variants
            .iter()
            .filter_map(|v| v.calculated_price.as_ref())
            .filter(|p| p.calculated_amount.is_some())
            .min_by_key(|p| p.calculated_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTag {
    pub id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub calculated_price: Option<CalculatedPrice>,
}

/// Region-specific price computed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatedPrice {
    #[serde(default)]
    pub calculated_amount: Option<Decimal>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

/// One page of `GET /store/products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub count: u32,
    pub offset: u32,
    pub limit: u32,
}

/// Body of `GET /store/products/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ProductEnvelope {
    pub product: Product,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_page_deserializes_with_missing_optionals() {
        let json = r#"{
            "products": [{
                "id": "prod_01",
                "handle": "wooden-stacker",
                "title": "Wooden Stacker",
                "description": null,
                "variants": [
                    {"id": "var_1", "calculated_price": {"calculated_amount": 899, "currency_code": "inr"}},
                    {"id": "var_2", "calculated_price": {"calculated_amount": 749.5, "currency_code": "inr"}},
                    {"id": "var_3"}
                ],
                "collection_id": "ignored"
            }],
            "count": 1,
            "offset": 0,
            "limit": 50
        }"#;

        let page: ProductPage = serde_json::from_str(json).unwrap();
        let product = &page.products[0];
        assert_eq!(product.handle, "wooden-stacker");
        assert!(product.tags.is_empty());
        assert_eq!(
            product.min_price().unwrap().calculated_amount,
            Some(Decimal::new(7495, 1))
        );
    }
}
