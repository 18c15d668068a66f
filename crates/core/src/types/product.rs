//! Product types as returned by `GET /products` and `GET /products/:id`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId, ReviewId};
use super::nullable::null_as_default;
use super::price;

/// A product as returned by the API. Read only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub compare_at_price: Option<Decimal>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub review_count: u32,
    #[serde(default)]
    pub category: Option<ProductCategory>,
    /// Free-form key/value specifications (values may be strings or numbers).
    #[serde(default, deserialize_with = "null_as_default")]
    pub specifications: BTreeMap<String, serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviews: Vec<Review>,
}

/// The category a product belongs to.
///
/// Listings send a bare ID; detail payloads may embed `{id, name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductCategory {
    Id(CategoryId),
    Summary { id: CategoryId, name: String },
}

impl ProductCategory {
    #[must_use]
    pub const fn id(&self) -> CategoryId {
        match self {
            Self::Id(id) | Self::Summary { id, .. } => *id,
        }
    }

    /// Display name, when the payload carried one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Summary { name, .. } => Some(name),
        }
    }
}

/// A shopper review embedded in a product detail payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: Option<ReviewId>,
    #[serde(default, alias = "name")]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether at least one unit can be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// First image URL, used for cards and cart rows.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Compare-at price, only when it is higher than the selling price.
    #[must_use]
    pub fn effective_compare_at(&self) -> Option<Decimal> {
        self.compare_at_price.filter(|compare| *compare > self.price)
    }

    /// Whole-number discount against the compare-at price.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        self.compare_at_price
            .and_then(|compare| price::discount_percent(self.price, compare))
    }

    /// Specifications flattened to display strings, in key order.
    ///
    /// String values are shown without JSON quotes; `null` values are skipped.
    #[must_use]
    pub fn specification_rows(&self) -> Vec<(String, String)> {
        self.specifications
            .iter()
            .filter_map(|(key, value)| {
                let shown = match value {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((key.clone(), shown))
            })
            .collect()
    }
}
