//! Structured product sheets.
//!
//! Product exports arrive as JSON, either a single object or an array whose
//! first element is the product. Only `product_id`, `title` and
//! `description` are required; everything else defaults to empty.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{CoreError, CoreResult};

/// A user review attached to a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductReview {
    /// Review text
    #[serde(default)]
    pub opinion: String,
}

/// Catalog data for the product an article is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductData {
    /// Catalog id
    pub product_id: String,
    /// Id in the previous catalog
    #[serde(default)]
    pub legacy_id: String,
    /// Product name
    pub title: String,
    /// Marketing description
    pub description: String,
    /// Manufacturer
    #[serde(default)]
    pub brand_name: String,
    /// Catalog family, e.g. "Laptops"
    #[serde(default)]
    pub family_name: String,
    /// Technical attributes by name
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Image URLs, main image first
    #[serde(default)]
    pub images: Vec<String>,
    /// Number of user reviews
    #[serde(default, rename = "totalComments")]
    pub total_comments: u32,
    /// Summary of what reviewers like
    #[serde(default)]
    pub advantages: String,
    /// Summary of what reviewers dislike
    #[serde(default)]
    pub disadvantages: String,
    /// Individual reviews
    #[serde(default)]
    pub comments: Vec<ProductReview>,
}

impl ProductData {
    /// Parse a product export.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidRequest(format!("product JSON is invalid: {}", e)))?;

        let product = match value {
            Value::Array(items) => items
                .into_iter()
                .next()
                .ok_or_else(|| CoreError::InvalidRequest("product JSON array is empty".to_string()))?,
            object @ Value::Object(_) => object,
            _ => {
                return Err(CoreError::InvalidRequest(
                    "product JSON must be an object or an array".to_string(),
                ))
            }
        };

        let product: Self = serde_json::from_value(product)
            .map_err(|e| CoreError::InvalidRequest(format!("product JSON: {}", e)))?;
        if product.title.trim().is_empty() {
            return Err(CoreError::InvalidRequest("product JSON: title is empty".to_string()));
        }
        Ok(product)
    }

    /// Whether users have reviewed the product.
    pub fn has_reviews(&self) -> bool {
        self.total_comments > 0
    }

    /// First image, if any.
    pub fn main_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Attributes as display strings, in name order.
    pub fn attribute_lines(&self) -> impl Iterator<Item = (&str, String)> {
        self.attributes.iter().map(|(name, value)| {
            let shown = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.as_str(), shown)
        })
    }

    /// Non-empty review texts, in export order.
    pub fn opinions(&self) -> impl Iterator<Item = &str> {
        self.comments.iter().map(|c| c.opinion.trim()).filter(|o| !o.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[{
        "product_id": "10873412",
        "legacy_id": "1087341",
        "title": "Laptop X 15 Ryzen 7",
        "description": "A light 15-inch laptop.",
        "brand_name": "Acme",
        "family_name": "Laptops",
        "attributes": {"RAM": "16 GB", "Weight (kg)": 1.6},
        "images": ["https://img.example/x1.jpg", "https://img.example/x2.jpg"],
        "features": null,
        "totalComments": 42,
        "advantages": "Battery life",
        "disadvantages": "Glossy screen",
        "comments": [{"opinion": "Great value"}, {"opinion": "  "}, {"opinion": "Runs cool"}]
    }]"#;

    #[test]
    fn test_parse_array_export() {
        let product = ProductData::from_json(EXPORT).unwrap();
        assert_eq!(product.title, "Laptop X 15 Ryzen 7");
        assert_eq!(product.total_comments, 42);
        assert!(product.has_reviews());
        assert_eq!(product.main_image(), Some("https://img.example/x1.jpg"));

        let attributes: Vec<(&str, String)> = product.attribute_lines().collect();
        assert_eq!(attributes, vec![("RAM", "16 GB".to_string()), ("Weight (kg)", "1.6".to_string())]);
        assert_eq!(product.opinions().collect::<Vec<_>>(), vec!["Great value", "Runs cool"]);
    }

    #[test]
    fn test_parse_single_object_with_defaults() {
        let product =
            ProductData::from_json(r#"{"product_id": "1", "title": "Mouse", "description": "Wireless"}"#).unwrap();
        assert!(product.attributes.is_empty());
        assert!(!product.has_reviews());
        assert_eq!(product.main_image(), None);
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let err = ProductData::from_json(r#"{"product_id": "1", "title": "Mouse"}"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(msg) if msg.contains("description")));
    }

    #[test]
    fn test_malformed_exports_rejected() {
        for json in ["[]", "\"laptop\"", "{not json", r#"{"product_id": "1", "title": " ", "description": "x"}"#] {
            assert!(matches!(ProductData::from_json(json), Err(CoreError::InvalidRequest(_))), "{json}");
        }
    }
}
