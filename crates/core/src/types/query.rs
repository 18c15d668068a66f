//! Product listing queries and paginated results.

use serde::{Deserialize, Serialize};

use super::id::CategoryId;
use super::nullable::null_as_default;
use super::product::Product;

/// Sort order offered by the product listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    Name,
}

impl SortOrder {
    /// Every sort order, in the order shown in the sort select.
    pub const ALL: [Self; 5] = [
        Self::Newest,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Rating,
        Self::Name,
    ];

    /// Value sent as the `sort` query parameter (and used in storefront URLs).
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Rating => "rating",
            Self::Name => "name",
        }
    }

    /// Human-readable label for the sort select.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Rating => "Top rated",
            Self::Name => "Name",
        }
    }

    /// Parse a sort parameter leniently; unknown or empty values fall back to
    /// the default order.
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_param() == value.trim())
            .unwrap_or_default()
    }
}

/// Query for `GET /products`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub sort: SortOrder,
    pub category: Option<CategoryId>,
    pub page: u32,
    pub limit: u32,
}

impl ProductQuery {
    /// First page of the default listing.
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self {
            search: None,
            sort: SortOrder::Newest,
            category: None,
            page: 1,
            limit,
        }
    }

    /// Query string pairs, omitting empty search text and absent filters.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(5);
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        params.push(("sort", self.sort.as_param().to_string()));
        if let Some(category) = self.category {
            params.push(("category", category.to_string()));
        }
        params.push(("page", self.page.max(1).to_string()));
        params.push(("limit", self.limit.to_string()));
        params
    }
}

/// Pagination block of a paged product response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default, deserialize_with = "null_as_default")]
    pub page: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub limit: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u32,
    #[serde(default, alias = "totalPages", deserialize_with = "null_as_default")]
    pub pages: u32,
}

impl Pagination {
    /// Total page count, derived from `total / limit` when the API omits it.
    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        if self.pages > 0 {
            self.pages
        } else if self.limit > 0 {
            self.total.div_ceil(self.limit)
        } else {
            1
        }
    }

    /// Whether a previous page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Whether a next page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// A page of products.
///
/// `GET /products` may answer with either a bare array or an object carrying
/// `products` and `pagination`; both decode into this type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ProductPagePayload")]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProductPagePayload {
    Bare(Vec<Product>),
    Paged {
        products: Vec<Product>,
        #[serde(default)]
        pagination: Option<Pagination>,
    },
}

impl From<ProductPagePayload> for ProductPage {
    fn from(payload: ProductPagePayload) -> Self {
        let (products, pagination) = match payload {
            ProductPagePayload::Bare(products) => (products, None),
            ProductPagePayload::Paged {
                products,
                pagination,
            } => (products, pagination),
        };

        let pagination = pagination.unwrap_or_else(|| {
            let count = u32::try_from(products.len()).unwrap_or(u32::MAX);
            Pagination {
                page: 1,
                limit: count,
                total: count,
                pages: 1,
            }
        });

        Self {
            products,
            pagination,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_round_trips_through_param() {
        for sort in SortOrder::ALL {
            assert_eq!(SortOrder::from_param(sort.as_param()), sort);
        }
    }

    #[test]
    fn test_sort_order_unknown_falls_back() {
        assert_eq!(SortOrder::from_param(""), SortOrder::Newest);
        assert_eq!(SortOrder::from_param("cheapest"), SortOrder::Newest);
    }

    #[test]
    fn test_to_params_skips_blank_search() {
        let mut query = ProductQuery::new(12);
        query.search = Some("   ".to_string());
        query.page = 0;

        assert_eq!(
            query.to_params(),
            vec![
                ("sort", "newest".to_string()),
                ("page", "1".to_string()),
                ("limit", "12".to_string()),
            ]
        );
    }

    #[test]
    fn test_to_params_full() {
        let query = ProductQuery {
            search: Some(" lamp ".to_string()),
            sort: SortOrder::PriceDesc,
            category: Some(CategoryId::new(4)),
            page: 2,
            limit: 24,
        };

        assert_eq!(
            query.to_params(),
            vec![
                ("search", "lamp".to_string()),
                ("sort", "price_desc".to_string()),
                ("category", "4".to_string()),
                ("page", "2".to_string()),
                ("limit", "24".to_string()),
            ]
        );
    }

    #[test]
    fn test_decode_bare_list() {
        let page: ProductPage = serde_json::from_value(serde_json::json!([
            { "id": 1, "name": "A", "price": 1 },
            { "id": 2, "name": "B", "price": 2 }
        ]))
        .unwrap();

        assert_eq!(page.products.len(), 2);
        assert_eq!(page.pagination.total_pages(), 1);
        assert!(!page.pagination.has_next());
    }

    #[test]
    fn test_decode_paged_object() {
        let page: ProductPage = serde_json::from_value(serde_json::json!({
            "products": [{ "id": 1, "name": "A", "price": 1 }],
            "pagination": { "page": 2, "limit": 1, "total": 3 }
        }))
        .unwrap();

        assert_eq!(page.pagination.total_pages(), 3);
        assert!(page.pagination.has_previous());
        assert!(page.pagination.has_next());
    }

    #[test]
    fn test_pagination_total_pages_alias() {
        let pagination: Pagination =
            serde_json::from_str(r#"{"page":1,"limit":10,"total":95,"totalPages":10}"#).unwrap();
        assert_eq!(pagination.total_pages(), 10);
    }
}
