//! Cache types for product and category reads.
//!
//! Carts and profiles are per-shopper and always fetched live.

use shopfront_core::{Category, CategoryId, Product, ProductId, ProductPage, ProductQuery};

/// Cache key for products and categories.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(ProductQuery),
    Category(CategoryId),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
    Category(Category),
    Categories(Vec<Category>),
}
