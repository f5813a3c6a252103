//! Attachment repository.

use std::sync::Arc;

use crate::entities::{Attachment, attachment};
use mutuelle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Repository for attachment operations.
#[derive(Clone)]
pub struct AttachmentRepository {
    db: Arc<DatabaseConnection>,
}

impl AttachmentRepository {
    /// Create a new attachment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an attachment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<attachment::Model>> {
        Attachment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an attachment row directly.
    ///
    /// Bulk-seed path: callers hand a prebuilt model, including a declared
    /// size, bypassing the send-path size computation.
    pub async fn create(&self, model: attachment::ActiveModel) -> AppResult<attachment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attachments of a direct message.
    pub async fn find_by_message(&self, message_id: &str) -> AppResult<Vec<attachment::Model>> {
        Attachment::find()
            .filter(attachment::Column::MessageId.eq(message_id))
            .order_by_asc(attachment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Attachments of a group message.
    pub async fn find_by_group_message(
        &self,
        group_message_id: &str,
    ) -> AppResult<Vec<attachment::Model>> {
        Attachment::find()
            .filter(attachment::Column::GroupMessageId.eq(group_message_id))
            .order_by_asc(attachment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip the validity flag (the only mutation attachments support).
    pub async fn set_validity(&self, id: &str, is_valid: bool) -> AppResult<attachment::Model> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attachment not found: {id}")))?;

        if existing.is_valid == is_valid {
            return Ok(existing);
        }

        let mut active: attachment::ActiveModel = existing.into();
        active.is_valid = Set(is_valid);

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
