//! Attachment validation and persistence shared by direct and group sends.

use chrono::Utc;
use mutuelle_common::{AppError, AppResult, IdGenerator, MessagingConfig, generate_storage_key};
use mutuelle_db::entities::attachment::{self, FileCategory};
use sea_orm::Set;

use crate::services::storage::StorageService;

/// An attachment as received from the caller, before validation.
pub struct AttachmentUpload {
    /// Original file name.
    pub file_name: String,
    /// Raw content.
    pub data: Vec<u8>,
}

/// Validate every upload against the configured allow-list and size cap.
///
/// Runs before any row or file is persisted so a rejection leaves nothing
/// behind.
pub(crate) fn validate_uploads(
    config: &MessagingConfig,
    uploads: &[AttachmentUpload],
) -> AppResult<()> {
    for upload in uploads {
        let ext = upload
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !config.allowed_extensions.iter().any(|e| *e == ext) {
            return Err(AppError::Validation(format!(
                "File type not allowed: {}",
                upload.file_name
            )));
        }

        if upload.data.len() as i64 > config.max_attachment_size {
            return Err(AppError::Validation(format!(
                "File too large: {} ({} bytes, maximum {})",
                upload.file_name,
                upload.data.len(),
                config.max_attachment_size
            )));
        }
    }

    Ok(())
}

/// Parent a stored attachment belongs to.
pub(crate) enum AttachmentParent {
    Message(String),
    GroupMessage(String),
}

/// Upload validated files to storage and build their rows.
///
/// Size is always computed from the stored bytes; the only bypass is the
/// repository-level seed path which never goes through here.
pub(crate) async fn store_uploads(
    storage: &StorageService,
    id_gen: &IdGenerator,
    parent: &AttachmentParent,
    uploads: Vec<AttachmentUpload>,
) -> AppResult<Vec<attachment::ActiveModel>> {
    let now = Utc::now();
    let mut models = Vec::with_capacity(uploads.len());

    for upload in uploads {
        let id = id_gen.generate();
        let key = generate_storage_key(now, &id, &upload.file_name);
        let stored = storage.save(&key, &upload.data).await?;

        let (message_id, group_message_id) = match parent {
            AttachmentParent::Message(id) => (Some(id.clone()), None),
            AttachmentParent::GroupMessage(id) => (None, Some(id.clone())),
        };

        models.push(attachment::ActiveModel {
            id: Set(id),
            message_id: Set(message_id),
            group_message_id: Set(group_message_id),
            category: Set(FileCategory::from_file_name(&upload.file_name)),
            file_name: Set(upload.file_name),
            storage_key: Set(stored.key),
            url: Set(stored.url),
            size: Set(stored.size as i64),
            is_valid: Set(true),
            created_at: Set(now.into()),
        });
    }

    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, len: usize) -> AttachmentUpload {
        AttachmentUpload {
            file_name: name.to_string(),
            data: vec![0u8; len],
        }
    }

    #[test]
    fn test_rejects_disallowed_extension() {
        let config = MessagingConfig::default();
        let result = validate_uploads(&config, &[upload("virus.exe", 10)]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let config = MessagingConfig {
            max_attachment_size: 1024,
            ..MessagingConfig::default()
        };
        let result = validate_uploads(&config, &[upload("scan.pdf", 2048)]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_one_bad_upload_rejects_the_batch() {
        let config = MessagingConfig {
            max_attachment_size: 1024,
            ..MessagingConfig::default()
        };
        let result = validate_uploads(&config, &[upload("ok.pdf", 10), upload("big.pdf", 4096)]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let config = MessagingConfig::default();
        assert!(validate_uploads(&config, &[upload("Ordonnance.PDF", 10)]).is_ok());
    }
}
