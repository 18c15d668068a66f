//! Shopfront Core - types mirrored from the remote REST API.
//!
//! The storefront never owns business data. Every product, category, cart and
//! profile is a thin client-side mirror of a server response, held for the
//! duration of a single page render.
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients. This keeps it lightweight and lets the storefront and its tests
//! share one definition of the wire format.
//!
//! # Modules
//!
//! - [`types`] - Entities, the response envelope, listing queries, and
//!   newtype wrappers for IDs, prices and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
