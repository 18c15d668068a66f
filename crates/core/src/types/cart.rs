//! Cart types as returned by `GET /cart`.
//!
//! The cart is server-authoritative. The storefront never computes `subtotal`
//! or `item_count` itself; after every mutation the whole cart is fetched
//! again and replaces whatever was rendered before.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::CartItemId;
use super::nullable::null_as_default;
use super::product::Product;

/// The current shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<CartItem>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtotal: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub item_count: u32,
}

/// One line of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub quantity: u32,
    pub product: Product,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl CartItem {
    /// Line total as unit price times quantity, `None` on overflow.
    ///
    /// Display only; the cart subtotal always comes from the API.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.product.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Clamp a requested quantity to `[1, stock]`.
///
/// A product with no stock still clamps to 1 so the input stays valid; the
/// caller is expected to refuse the add when `stock == 0`.
#[must_use]
pub fn clamp_quantity(requested: u32, stock: u32) -> u32 {
    requested.clamp(1, stock.max(1))
}
