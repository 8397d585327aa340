//! Client-held cart id.

use std::sync::Mutex;

use crate::error::CommerceError;
use crate::ids::CartId;

/// Where the current cart id is remembered between visits.
pub trait CartIdStore: Send + Sync {
    fn load(&self) -> Result<Option<CartId>, CommerceError>;
    fn save(&self, id: &CartId) -> Result<(), CommerceError>;
    fn clear(&self) -> Result<(), CommerceError>;
}

/// Keeps the id for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryCartIdStore {
    id: Mutex<Option<CartId>>,
}

impl MemoryCartIdStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a previously persisted id.
    pub fn with_id(id: CartId) -> Self {
        Self {
            id: Mutex::new(Some(id)),
        }
    }
}

impl CartIdStore for MemoryCartIdStore {
    fn load(&self) -> Result<Option<CartId>, CommerceError> {
        Ok(self.id.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, id: &CartId) -> Result<(), CommerceError> {
        *self.id.lock().unwrap_or_else(|e| e.into_inner()) = Some(id.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CommerceError> {
        *self.id.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[cfg(feature = "storage")]
pub use cache_store::CacheCartIdStore;

#[cfg(feature = "storage")]
mod cache_store {
    use optic_cache::{cache_key, Cache};

    use super::CartIdStore;
    use crate::error::CommerceError;
    use crate::ids::CartId;

    /// Cart id kept in the key-value store under `cart:<scope>`.
    pub struct CacheCartIdStore {
        cache: Cache,
        key: String,
    }

    impl CacheCartIdStore {
        pub fn new(cache: Cache, scope: &str) -> Self {
            Self {
                cache,
                key: cache_key!("cart", scope),
            }
        }
    }

    impl CartIdStore for CacheCartIdStore {
        fn load(&self) -> Result<Option<CartId>, CommerceError> {
            Ok(self.cache.get(&self.key)?)
        }

        fn save(&self, id: &CartId) -> Result<(), CommerceError> {
            Ok(self.cache.set(&self.key, id)?)
        }

        fn clear(&self) -> Result<(), CommerceError> {
            Ok(self.cache.delete(&self.key)?)
        }
    }

}
