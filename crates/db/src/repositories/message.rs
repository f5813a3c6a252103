//! Message repository.

use std::sync::Arc;

use crate::entities::{Conversation, Message, attachment, conversation, message};
use chrono::Utc;
use mutuelle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};

/// Repository for message operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a message together with its attachments and touch the parent
    /// conversation, all in one transaction.
    ///
    /// All-or-nothing: if any insert fails, no message and no attachment row
    /// is persisted.
    pub async fn create_with_attachments(
        &self,
        message: message::ActiveModel,
        attachments: Vec<attachment::ActiveModel>,
    ) -> AppResult<(message::Model, Vec<attachment::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let message = message
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut created = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            created.push(
                attachment
                    .insert(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?,
            );
        }

        // The storage layer does not cascade parent timestamps; touch
        // explicitly in the same transaction.
        Conversation::update_many()
            .col_expr(
                conversation::Column::UpdatedAt,
                Expr::value(message.created_at),
            )
            .filter(conversation::Column::Id.eq(&message.conversation_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((message, created))
    }

    /// Find a message by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<message::Model>> {
        Message::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a message by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<message::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Message not found: {id}")))
    }

    /// Messages in a conversation, newest first.
    pub async fn find_by_conversation(
        &self,
        conversation_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>> {
        let mut query = Message::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .order_by_desc(message::Column::CreatedAt);

        if let Some(until) = until_id
            && let Some(until_msg) = self.find_by_id(until).await?
        {
            query = query.filter(message::Column::CreatedAt.lt(until_msg.created_at));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Latest message in a conversation.
    pub async fn find_latest_in_conversation(
        &self,
        conversation_id: &str,
    ) -> AppResult<Option<message::Model>> {
        Message::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .order_by_desc(message::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Total message count in a conversation.
    pub async fn count_in_conversation(&self, conversation_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Unread messages addressed to a user within one conversation.
    pub async fn count_unread_in_conversation(
        &self,
        conversation_id: &str,
        recipient_id: &str,
    ) -> AppResult<u64> {
        Message::find()
            .filter(message::Column::ConversationId.eq(conversation_id))
            .filter(message::Column::RecipientId.eq(recipient_id))
            .filter(message::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Unread messages addressed to a user across all conversations.
    pub async fn count_unread(&self, recipient_id: &str) -> AppResult<u64> {
        Message::find()
            .filter(message::Column::RecipientId.eq(recipient_id))
            .filter(message::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a message as read.
    ///
    /// Idempotent: an already-read message is returned unchanged, keeping
    /// its original `read_at`.
    pub async fn mark_read(&self, id: &str) -> AppResult<message::Model> {
        let msg = self.get_by_id(id).await?;

        if msg.is_read {
            return Ok(msg);
        }

        let mut active: message::ActiveModel = msg.into();
        active.is_read = Set(true);
        active.read_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a message as unread, clearing the read timestamp.
    pub async fn mark_unread(&self, id: &str) -> AppResult<message::Model> {
        let msg = self.get_by_id(id).await?;

        if !msg.is_read {
            return Ok(msg);
        }

        let mut active: message::ActiveModel = msg.into();
        active.is_read = Set(false);
        active.read_at = Set(None);

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::message::MessageKind;

    fn read_message(id: &str) -> message::Model {
        let now = Utc::now();
        message::Model {
            id: id.to_string(),
            conversation_id: "cnv1".to_string(),
            sender_id: "alice".to_string(),
            recipient_id: "bob".to_string(),
            title: None,
            text: "Bonjour".to_string(),
            kind: MessageKind::Message,
            is_read: true,
            read_at: Some(now.into()),
            created_at: now.into(),
        }
    }

    #[tokio::test]
    async fn test_mark_read_is_noop_when_already_read() {
        use sea_orm::{DatabaseBackend, MockDatabase};

        let msg = read_message("msg1");
        let original_read_at = msg.read_at;

        // Only the lookup is mocked; an update would fail for lack of an
        // appended exec result, so this also proves no write happens.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[msg]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let result = repo.mark_read("msg1").await.unwrap();

        assert!(result.is_read);
        assert_eq!(result.read_at, original_read_at);
    }

    #[tokio::test]
    async fn test_mark_read_missing_message() {
        use sea_orm::{DatabaseBackend, MockDatabase};

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<message::Model>::new()])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let result = repo.mark_read("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
