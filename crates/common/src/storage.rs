//! File storage abstraction for message attachments.
//!
//! The messaging core records only the storage key, original filename and
//! computed size; the bytes live behind this backend.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::{AppError, AppResult};

/// Uploaded file metadata.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Storage key (path within the backend).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MD5 hash of the content.
    pub md5: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a file under the given key.
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<StoredFile>;

    /// Delete a file.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Build a storage key organized by upload date.
#[must_use]
pub fn generate_storage_key(uploaded_at: DateTime<Utc>, file_id: &str, file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("{}/{file_id}_{sanitized}", uploaded_at.format("%Y/%m/%d"))
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self { base_path, base_url }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<StoredFile> {
        let path = self.base_path.join(key);

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        let md5 = format!("{:x}", md5::compute(data));

        Ok(StoredFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            md5,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.base_path.join(key);
        Ok(path.exists())
    }
}

/// No-op storage backend for tests and deployments without a file store.
pub struct NoOpStorage;

#[async_trait::async_trait]
impl StorageBackend for NoOpStorage {
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<StoredFile> {
        Ok(StoredFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            md5: format!("{:x}", md5::compute(data)),
        })
    }

    async fn delete(&self, _key: &str) -> AppResult<()> {
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("/files/{key}")
    }

    async fn exists(&self, _key: &str) -> AppResult<bool> {
        Ok(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_storage_key_is_date_organized() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).single().unwrap();
        let key = generate_storage_key(at, "01abc", "ordonnance.pdf");
        assert_eq!(key, "2026/03/14/01abc_ordonnance.pdf");
    }

    #[test]
    fn test_storage_key_sanitizes_name() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).single().unwrap();
        let key = generate_storage_key(at, "01abc", "bon de soin/2026.pdf");
        assert!(!key["2026/01/02/".len()..].contains('/'));
        assert!(key.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_noop_storage_reports_size() {
        let storage = NoOpStorage;
        let stored = storage.save("2026/01/01/x_a.txt", b"hello").await.unwrap();
        assert_eq!(stored.size, 5);
        assert_eq!(stored.url, "/files/2026/01/01/x_a.txt");
    }
}
