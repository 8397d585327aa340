//! Key-value store for client-held Optic Commerce state.
//!
//! Backed by Spin's Key-Value Store on wasm32 and by an in-process map
//! elsewhere. Values are stored as JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use optic_cache::{cache_key, Cache};
//!
//! let cache = Cache::open_default()?;
//! let key = cache_key!("cart", "web");
//!
//! cache.set(&key, &cart_id)?;
//! let id: Option<String> = cache.get(&key)?;
//! cache.delete(&key)?;
//! ```

mod error;
mod kv;

pub use error::CacheError;
pub use kv::Cache;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Cache, CacheError};
}
