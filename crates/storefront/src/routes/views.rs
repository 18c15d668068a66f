//! Display data for templates.
//!
//! API types are converted into these flat, pre-formatted views so templates
//! never do arithmetic or formatting beyond simple filters.

use shopfront_core::{
    Cart, CartItem, Category, CategoryId, Pagination, Product, ProductCategory, ProductId, Review,
    SortOrder, format_price,
};

/// Product card in grids and listings.
#[derive(Debug, Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub discount_percent: Option<u32>,
    pub image: Option<String>,
    pub rating: f64,
    pub review_count: u32,
    pub in_stock: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: format_price(product.price),
            compare_at_price: product.effective_compare_at().map(format_price),
            discount_percent: product.discount_percent(),
            image: product.primary_image().map(str::to_string),
            rating: product.rating,
            review_count: product.review_count,
            in_stock: product.in_stock(),
        }
    }
}

/// Review shown on the product detail page.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub author: String,
    pub rating: f64,
    pub comment: Option<String>,
    pub date: Option<String>,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            author: review
                .user_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "Anonymous".to_string()),
            rating: review.rating,
            comment: review.comment.clone(),
            date: review
                .created_at
                .map(|created| created.format("%b %-d, %Y").to_string()),
        }
    }
}

/// Full product detail.
#[derive(Debug, Clone)]
pub struct ProductDetailView {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub discount_percent: Option<u32>,
    pub images: Vec<String>,
    pub stock: u32,
    pub in_stock: bool,
    pub category_id: Option<CategoryId>,
    pub category_name: String,
    /// Upper bound of the quantity input; at least 1 so the input stays valid.
    pub max_quantity: u32,
    pub rating: f64,
    pub review_count: u32,
    pub specifications: Vec<(String, String)>,
    pub tags: Vec<String>,
    pub reviews: Vec<ReviewView>,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: format_price(product.price),
            compare_at_price: product.effective_compare_at().map(format_price),
            discount_percent: product.discount_percent(),
            images: product.images.clone(),
            stock: product.stock,
            in_stock: product.in_stock(),
            category_id: product.category.as_ref().map(ProductCategory::id),
            category_name: product
                .category
                .as_ref()
                .and_then(ProductCategory::name)
                .unwrap_or("More in this category")
                .to_string(),
            max_quantity: product.stock.max(1),
            rating: product.rating,
            review_count: product.review_count,
            specifications: product.specification_rows(),
            tags: product.tags.clone(),
            reviews: product.reviews.iter().map(ReviewView::from).collect(),
        }
    }
}

/// One cart row.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub unit_price: String,
    pub line_price: String,
    pub quantity: u32,
    pub max_quantity: u32,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id,
            name: item.product.name.clone(),
            image: item.product.primary_image().map(str::to_string),
            unit_price: format_price(item.product.price),
            line_price: item.line_total().map(format_price).unwrap_or_default(),
            quantity: item.quantity.max(1),
            max_quantity: item.product.stock.max(item.quantity).max(1),
        }
    }
}

/// The cart as rendered on the cart page.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Whether the cart has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.iter().map(CartItemView::from).collect(),
            subtotal: format_price(cart.subtotal),
            item_count: cart.item_count,
        }
    }
}

/// Category tile.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub product_count: Option<u32>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
            image: category.image.clone(),
            product_count: category.product_count,
        }
    }
}

/// Option in the sort select.
#[derive(Debug, Clone)]
pub struct SortOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl SortOptionView {
    /// Every sort order, with `current` selected.
    #[must_use]
    pub fn all(current: SortOrder) -> Vec<Self> {
        SortOrder::ALL
            .into_iter()
            .map(|sort| Self {
                value: sort.as_param(),
                label: sort.label(),
                selected: sort == current,
            })
            .collect()
    }
}

/// Option in the category filter select.
#[derive(Debug, Clone)]
pub struct CategoryOptionView {
    pub id: CategoryId,
    pub name: String,
    pub selected: bool,
}

impl CategoryOptionView {
    /// Every category, with `current` selected.
    #[must_use]
    pub fn all(categories: &[Category], current: Option<CategoryId>) -> Vec<Self> {
        categories
            .iter()
            .map(|category| Self {
                id: category.id,
                name: category.name.clone(),
                selected: Some(category.id) == current,
            })
            .collect()
    }
}

/// Previous/next pagination controls.
#[derive(Debug, Clone)]
pub struct PagerView {
    pub page: u32,
    pub total_pages: u32,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

impl PagerView {
    /// Build pager links with `href` mapping a page number to its URL.
    #[must_use]
    pub fn new(pagination: &Pagination, href: impl Fn(u32) -> String) -> Self {
        let page = pagination.page.max(1);
        let total_pages = pagination.total_pages().max(1);
        Self {
            page,
            total_pages,
            previous_url: (page > 1).then(|| href(page - 1)),
            next_url: (page < total_pages).then(|| href(page + 1)),
        }
    }

    /// Whether any pager control is worth showing.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.total_pages > 1
    }
}
