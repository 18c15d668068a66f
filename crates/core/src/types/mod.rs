//! Core types for Shopfront.
//!
//! Field names follow the API's camelCase JSON; every optional field the API
//! may omit is `#[serde(default)]` so partial payloads still decode, and
//! collections and counts also accept `null` via [`nullable::null_as_default`].

pub mod cart;
pub mod category;
pub mod email;
pub mod envelope;
pub mod id;
pub mod nullable;
pub mod price;
pub mod product;
pub mod query;
pub mod user;

pub use cart::{Cart, CartItem, clamp_quantity};
pub use category::Category;
pub use email::{Email, EmailError};
pub use envelope::ApiEnvelope;
pub use id::*;
pub use price::{discount_percent, format_price};
pub use product::{Product, ProductCategory, Review};
pub use query::{Pagination, ProductPage, ProductQuery, SortOrder};
pub use user::{AuthPayload, LoginRequest, RegisterRequest, UpdateProfileRequest, UserProfile};
