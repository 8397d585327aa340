//! Key-Value store wrapper with automatic serialization.

use serde::{de::DeserializeOwned, Serialize};
use tracing::trace;

use crate::CacheError;

#[cfg(not(target_arch = "wasm32"))]
use std::{collections::HashMap, sync::Mutex};

/// Type-safe cache.
///
/// Any `Serialize + DeserializeOwned` value can be stored; it is kept as JSON bytes.
pub struct Cache {
    #[cfg(target_arch = "wasm32")]
    store: spin_sdk::key_value::Store,
    #[cfg(not(target_arch = "wasm32"))]
    store: Mutex<HashMap<String, Vec<u8>>>,
}

impl Cache {
    /// Open the default store.
    pub fn open_default() -> Result<Self, CacheError> {
        Self::open("default")
    }

    /// Open a named store.
    #[cfg(target_arch = "wasm32")]
    pub fn open(name: &str) -> Result<Self, CacheError> {
        let store = spin_sdk::key_value::Store::open(name)
            .map_err(|e| CacheError::OpenError(e.to_string()))?;
        Ok(Self { store })
    }

    /// Open a named store. Each call returns an empty, process-local store.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open(name: &str) -> Result<Self, CacheError> {
        trace!(store = name, "opening in-process store");
        Ok(Self {
            store: Mutex::new(HashMap::new()),
        })
    }

    /// Get a value, `None` if the key doesn't exist.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_bytes(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set a value.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        trace!(key, bytes = bytes.len(), "cache set");
        self.set_bytes(key, bytes)
    }

    /// Delete a value. Deleting a missing key is not an error.
    #[cfg(target_arch = "wasm32")]
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store
            .delete(key)
            .map_err(|e| CacheError::StoreError(e.to_string()))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.map()?.remove(key);
        Ok(())
    }

    /// Check if a key exists.
    #[cfg(target_arch = "wasm32")]
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.store
            .exists(key)
            .map_err(|e| CacheError::StoreError(e.to_string()))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.map()?.contains_key(key))
    }

    #[cfg(target_arch = "wasm32")]
    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.store
            .get(key)
            .map_err(|e| CacheError::StoreError(e.to_string()))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.map()?.get(key).cloned())
    }

    #[cfg(target_arch = "wasm32")]
    fn set_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<(), CacheError> {
        self.store
            .set(key, &bytes)
            .map_err(|e| CacheError::StoreError(e.to_string()))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn set_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<(), CacheError> {
        self.map()?.insert(key.to_string(), bytes);
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn map(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, CacheError> {
        self.store
            .lock()
            .map_err(|_| CacheError::StoreError("store lock poisoned".to_string()))
    }
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust,ignore
/// let key = cache_key!("cart", scope);
/// // Returns "cart:web"
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let cache = Cache::open_default().unwrap();
        cache.set("cart:web", &"gid://shop/Cart/1").unwrap();
        assert!(cache.exists("cart:web").unwrap());
        let id: Option<String> = cache.get("cart:web").unwrap();
        assert_eq!(id.as_deref(), Some("gid://shop/Cart/1"));

        cache.delete("cart:web").unwrap();
        cache.delete("cart:web").unwrap();
        assert_eq!(cache.get::<String>("cart:web").unwrap(), None);
    }

    #[test]
    fn test_type_mismatch_is_a_serialization_error() {
        let cache = Cache::open("carts").unwrap();
        cache.set("n", &42u32).unwrap();
        assert!(matches!(
            cache.get::<Vec<String>>("n"),
            Err(CacheError::SerializeError(_))
        ));
    }

    #[test]
    fn test_cache_key_joins_parts() {
        assert_eq!(cache_key!("cart", "web"), "cart:web");
        assert_eq!(cache_key!("rx", "customer", 7), "rx:customer:7");
    }
}
