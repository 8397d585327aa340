//! Cart id persisted to a file between CLI runs.

use std::path::PathBuf;

use optic_commerce::cart::CartIdStore;
use optic_commerce::{CartId, CommerceError};

/// Keeps the cart id in a single text file.
pub struct FileCartIdStore {
    path: PathBuf,
}

impl FileCartIdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn io_error(e: std::io::Error) -> CommerceError {
    CommerceError::CacheError(e.to_string())
}

impl CartIdStore for FileCartIdStore {
    fn load(&self) -> Result<Option<CartId>, CommerceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| CartId::new(id)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }

    fn save(&self, id: &CartId) -> Result<(), CommerceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&self.path, id.as_str()).map_err(io_error)
    }

    fn clear(&self) -> Result<(), CommerceError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_error(e)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = std::env::temp_dir().join(format!("optic-cli-store-{}", std::process::id()));
        let store = FileCartIdStore::new(dir.join("cart-id"));

        assert_eq!(store.load().unwrap(), None);
        store.save(&CartId::new("gid://shopify/Cart/c1")).unwrap();
        assert_eq!(store.load().unwrap(), Some(CartId::new("gid://shopify/Cart/c1")));
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }
}
