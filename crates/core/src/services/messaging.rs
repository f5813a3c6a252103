//! Messaging service for direct messages.

use chrono::Utc;
use mutuelle_common::{AppError, AppResult, IdGenerator, MessagingConfig};
use mutuelle_db::{
    entities::{
        attachment, conversation,
        message::{self, MessageKind},
    },
    repositories::{AttachmentRepository, ConversationRepository, MessageRepository},
};
use sea_orm::Set;

use crate::services::{
    attachments::{AttachmentParent, AttachmentUpload, store_uploads, validate_uploads},
    conversation::ConversationService,
    storage::StorageService,
};

/// Input for creating a new message.
pub struct CreateMessageInput {
    pub title: Option<String>,
    pub text: String,
    pub kind: MessageKind,
    pub attachments: Vec<AttachmentUpload>,
}

impl CreateMessageInput {
    /// Plain message with just a body.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            title: None,
            text: text.into(),
            kind: MessageKind::Message,
            attachments: Vec::new(),
        }
    }
}

/// A message as persisted, with its attachments.
pub struct SentMessage {
    pub message: message::Model,
    pub attachments: Vec<attachment::Model>,
}

/// Conversation summary for listing.
pub struct ConversationSummary {
    pub conversation: conversation::Model,
    /// The other participant.
    pub partner_id: String,
    /// Unread messages addressed to the requesting user.
    pub unread_count: u64,
    /// Total messages in the conversation.
    pub message_count: u64,
    pub last_message: Option<message::Model>,
    /// Most recent activity; the conversation's own creation time when no
    /// message exists yet.
    pub last_activity_at: sea_orm::prelude::DateTimeWithTimeZone,
}

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: MessageRepository,
    attachment_repo: AttachmentRepository,
    conversation_repo: ConversationRepository,
    conversation_service: ConversationService,
    storage: StorageService,
    config: MessagingConfig,
    id_gen: IdGenerator,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(
        message_repo: MessageRepository,
        attachment_repo: AttachmentRepository,
        conversation_repo: ConversationRepository,
        conversation_service: ConversationService,
        storage: StorageService,
        config: MessagingConfig,
    ) -> Self {
        Self {
            message_repo,
            attachment_repo,
            conversation_repo,
            conversation_service,
            storage,
            config,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a message to another user.
    ///
    /// The conversation is resolved for the pair, so the same thread is used
    /// regardless of which side sends. Validation happens before any row or
    /// file is persisted; the message and its attachments are then written
    /// in one transaction.
    pub async fn send_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        input: CreateMessageInput,
    ) -> AppResult<SentMessage> {
        if input.text.trim().is_empty() {
            return Err(AppError::Validation("Message body is required".to_string()));
        }

        validate_uploads(&self.config, &input.attachments)?;

        // Also validates both users and rejects sender == recipient.
        let conversation = self
            .conversation_service
            .resolve_or_create(sender_id, recipient_id)
            .await?;

        let message_id = self.id_gen.generate();

        let attachment_models = store_uploads(
            &self.storage,
            &self.id_gen,
            &AttachmentParent::Message(message_id.clone()),
            input.attachments,
        )
        .await?;

        let model = message::ActiveModel {
            id: Set(message_id),
            conversation_id: Set(conversation.id.clone()),
            sender_id: Set(sender_id.to_string()),
            recipient_id: Set(recipient_id.to_string()),
            title: Set(input.title),
            text: Set(input.text),
            kind: Set(input.kind),
            is_read: Set(false),
            read_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        let (message, attachments) = self
            .message_repo
            .create_with_attachments(model, attachment_models)
            .await?;

        tracing::info!(
            message = %message.id,
            conversation = %conversation.id,
            sender = %sender_id,
            recipient = %recipient_id,
            attachments = attachments.len(),
            "Message sent"
        );

        Ok(SentMessage {
            message,
            attachments,
        })
    }

    /// Messages exchanged with a partner, newest first.
    ///
    /// Returns an empty list when the pair has no conversation yet.
    pub async fn get_conversation_messages(
        &self,
        user_id: &str,
        partner_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<message::Model>> {
        let Some(conversation) = self
            .conversation_repo
            .find_by_pair(user_id, partner_id)
            .await?
        else {
            return Ok(vec![]);
        };

        self.message_repo
            .find_by_conversation(&conversation.id, limit, until_id)
            .await
    }

    /// Get a message by ID.
    pub async fn get_message(&self, message_id: &str) -> AppResult<Option<message::Model>> {
        self.message_repo.find_by_id(message_id).await
    }

    /// Attachments of a message.
    pub async fn get_attachments(&self, message_id: &str) -> AppResult<Vec<attachment::Model>> {
        self.attachment_repo.find_by_message(message_id).await
    }

    /// Mark a message as read on behalf of its recipient.
    ///
    /// Idempotent: re-reading an already-read message changes nothing and
    /// keeps the original read timestamp.
    pub async fn mark_read(&self, user_id: &str, message_id: &str) -> AppResult<message::Model> {
        let message = self.message_repo.get_by_id(message_id).await?;

        if message.recipient_id != user_id {
            return Err(AppError::Forbidden(
                "Only the recipient can mark a message read".to_string(),
            ));
        }

        self.message_repo.mark_read(message_id).await
    }

    /// Mark a message as unread on behalf of its recipient. Idempotent.
    pub async fn mark_unread(&self, user_id: &str, message_id: &str) -> AppResult<message::Model> {
        let message = self.message_repo.get_by_id(message_id).await?;

        if message.recipient_id != user_id {
            return Err(AppError::Forbidden(
                "Only the recipient can mark a message unread".to_string(),
            ));
        }

        self.message_repo.mark_unread(message_id).await
    }

    /// Unread messages addressed to a user.
    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.message_repo.count_unread(user_id).await
    }

    /// Conversations of a user, most recent activity first.
    ///
    /// Each entry carries the unread count scoped to the requesting user,
    /// the total message count and the latest message. Conversations without
    /// messages sort on their own creation timestamp.
    pub async fn conversations_for_user(
        &self,
        user_id: &str,
        limit: Option<u64>,
    ) -> AppResult<Vec<ConversationSummary>> {
        let conversations = self.conversation_repo.find_for_user(user_id, limit).await?;

        let mut summaries = Vec::with_capacity(conversations.len());

        for conversation in conversations {
            let last_message = self
                .message_repo
                .find_latest_in_conversation(&conversation.id)
                .await?;

            let unread_count = self
                .message_repo
                .count_unread_in_conversation(&conversation.id, user_id)
                .await?;

            let message_count = self.message_repo.count_in_conversation(&conversation.id).await?;

            let partner_id = partner_from_pair_key(&conversation.pair_key, user_id);

            let last_activity_at = last_message
                .as_ref()
                .map_or(conversation.created_at, |m| m.created_at);

            summaries.push(ConversationSummary {
                conversation,
                partner_id,
                unread_count,
                message_count,
                last_message,
                last_activity_at,
            });
        }

        summaries.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));

        Ok(summaries)
    }
}

/// The other side of a canonical pair key.
fn partner_from_pair_key(pair_key: &str, user_id: &str) -> String {
    match pair_key.split_once(':') {
        Some((a, b)) if a == user_id => b.to_string(),
        Some((a, _)) => a.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mutuelle_common::NoOpStorage;
    use mutuelle_db::repositories::UserRepository;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service_on(db: Arc<DatabaseConnection>) -> MessagingService {
        let conversation_repo = ConversationRepository::new(Arc::clone(&db));
        let conversation_service = ConversationService::new(
            conversation_repo.clone(),
            UserRepository::new(Arc::clone(&db)),
        );
        MessagingService::new(
            MessageRepository::new(Arc::clone(&db)),
            AttachmentRepository::new(Arc::clone(&db)),
            conversation_repo,
            conversation_service,
            StorageService::new(Arc::new(NoOpStorage)),
            MessagingConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected_before_any_query() {
        // No mocked results: any database access would fail the test.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service_on(db);

        let result = service
            .send_message("alice", "bob", CreateMessageInput::text("   "))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_bad_attachment_rejects_whole_send() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service_on(db);

        let input = CreateMessageInput {
            title: None,
            text: "Voici le dossier".to_string(),
            kind: MessageKind::Document,
            attachments: vec![
                AttachmentUpload {
                    file_name: "dossier.pdf".to_string(),
                    data: vec![0u8; 128],
                },
                AttachmentUpload {
                    file_name: "script.sh".to_string(),
                    data: vec![0u8; 16],
                },
            ],
        };

        let result = service.send_message("alice", "bob", input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_partner_from_pair_key() {
        assert_eq!(partner_from_pair_key("alice:bob", "alice"), "bob");
        assert_eq!(partner_from_pair_key("alice:bob", "bob"), "alice");
    }
}
