//! Storage service over the configured backend.

use std::sync::Arc;

use mutuelle_common::{AppResult, StorageBackend, StoredFile};

/// Thin service wrapping the file storage backend.
#[derive(Clone)]
pub struct StorageService {
    backend: Arc<dyn StorageBackend>,
}

impl StorageService {
    /// Create a new storage service.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Store attachment bytes under the given key.
    pub async fn save(&self, key: &str, data: &[u8]) -> AppResult<StoredFile> {
        self.backend.save(key, data).await
    }

    /// Public URL for a stored key.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        self.backend.public_url(key)
    }
}
