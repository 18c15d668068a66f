//! Client for the Shopfront REST API.
//!
//! # Architecture
//!
//! - Every request goes through [`ApiClient`], which prefixes the configured
//!   base URL, attaches the session's bearer token, and decodes the uniform
//!   `{success, data, message?}` envelope
//! - The API is the source of truth - NO local copies beyond a short-lived
//!   `moka` cache for product and category reads
//! - A 401 from any endpoint surfaces as [`ApiError::Unauthorized`], which the
//!   application treats as session expiry
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_storefront::api::{ApiClient, CartMutation};
//!
//! let client = ApiClient::new(&config.api)?;
//!
//! let product = client.get_product(ProductId::new(7)).await?;
//! let sync = client
//!     .mutate_and_refetch(&token, CartMutation::Add { product_id: product.id, quantity: 1 })
//!     .await;
//! let cart = sync.cart?;
//! ```

mod cache;
mod client;

pub use client::{ApiClient, CartMutation, CartSync};

use thiserror::Error;

/// Errors that can occur when calling the REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request URL could not be built from the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The response body was not a valid envelope.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API answered 401; the session token is missing, invalid or expired.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The API refused the request (non-2xx status or `success: false`).
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code of the response.
        status: u16,
        /// Message from the envelope, or the status reason.
        message: String,
    },

    /// A successful envelope carried no `data` where data was required.
    #[error("Response contained no data")]
    MissingData,
}

impl ApiError {
    /// Whether this error means the session is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Message safe to show a shopper in an inline error banner.
    ///
    /// Messages the API wrote for 4xx rejections (e.g. "Insufficient stock")
    /// are passed through; transport and server failures get a generic line.
    #[must_use]
    pub fn shopper_message(&self) -> String {
        match self {
            Self::Rejected { status, message } if (400..500).contains(status) => message.clone(),
            Self::NotFound(_) => "We couldn't find what you were looking for.".to_string(),
            Self::RateLimited(_) => "The store is busy right now. Please try again in a moment.".to_string(),
            Self::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            Self::Http(e) if e.is_timeout() => "The store took too long to respond. Please try again.".to_string(),
            _ => "Something went wrong while talking to the store. Please try again.".to_string(),
        }
    }
}
