use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;
use uuid::Uuid;

use crate::error::ServerError;

/// In-memory image store with a size cap.
#[derive(Debug)]
pub struct ImageStore {
    images: Mutex<HashMap<Uuid, Vec<u8>>>,
    max_size: usize,
}

impl ImageStore {
    pub fn new(max_size: usize) -> Self {
        Self {
            images: Mutex::new(HashMap::new()),
            max_size,
        }
    }

    pub fn store(&self, data: Vec<u8>) -> Result<Uuid, ServerError> {
        if data.is_empty() {
            return Err(ServerError::BadRequest("Empty image".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::ImageTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let id = Uuid::new_v4();
        let size = data.len();
        self.lock()?.insert(id, data);

        debug!(id = %id, size, "Stored image");
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Result<Vec<u8>, ServerError> {
        self.lock()?
            .get(&id)
            .cloned()
            .ok_or(ServerError::ImageNotFound(id))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Vec<u8>>>, ServerError> {
        self.images
            .lock()
            .map_err(|e| ServerError::Internal(format!("Image store lock poisoned: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> ImageStore {
        ImageStore::new(1024)
    }

    #[test]
    fn test_store_and_get() {
        let store = test_store();
        let id = store.store(b"png-bytes".to_vec()).unwrap();
        assert_eq!(store.get(id).unwrap(), b"png-bytes");
    }

    #[test]
    fn test_not_found() {
        let store = test_store();
        assert!(store.get(Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_empty_image_rejected() {
        let store = test_store();
        assert!(store.store(Vec::new()).is_err());
    }

    #[test]
    fn test_oversize_rejected() {
        let store = test_store();
        let result = store.store(vec![0u8; 2048]);
        assert!(matches!(
            result,
            Err(ServerError::ImageTooLarge { size: 2048, .. })
        ));
    }
}
