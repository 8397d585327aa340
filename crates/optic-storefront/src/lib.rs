//! Storefront adapter for Optic Commerce.
//!
//! [`StorefrontClient`] implements the cart engine's
//! [`CommerceBackend`](optic_commerce::cart::CommerceBackend) port against the
//! storefront GraphQL cart API. Requests travel over an [`HttpTransport`]:
//! `ureq` natively, Spin outbound HTTP inside a component.
//!
//! # Example
//!
//! ```rust,ignore
//! use optic_commerce::cart::{CartRules, CartService, MemoryCartIdStore};
//! use optic_storefront::{StorefrontClient, StorefrontConfig};
//!
//! let client = StorefrontClient::connect(StorefrontConfig::new(
//!     "https://optic.myshopify.com",
//!     token,
//! ));
//! let service = CartService::new(
//!     Arc::new(client),
//!     Arc::new(MemoryCartIdStore::new()),
//!     CartRules::default(),
//! );
//! let cart = service.load_or_create().await?;
//! ```

mod client;
mod config;
mod error;
mod queries;
mod request;
mod response;
mod transport;
mod wire;

pub use client::{StorefrontClient, ACCESS_TOKEN_HEADER};
pub use config::{StorefrontConfig, DEFAULT_API_VERSION};
pub use error::FetchError;
pub use request::{Method, RequestBuilder};
pub use response::Response;
#[cfg(target_arch = "wasm32")]
pub use transport::SpinTransport;
pub use transport::HttpTransport;
#[cfg(not(target_arch = "wasm32"))]
pub use transport::UreqTransport;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{FetchError, HttpTransport, StorefrontClient, StorefrontConfig};
}
