//! Conversation resolution service.
//!
//! The one operation with a real cross-call invariant: given two distinct
//! users, return the existing conversation between them or create one, so
//! that at most one conversation exists per unordered pair.

use mutuelle_common::{AppError, AppResult, IdGenerator};
use mutuelle_db::{
    entities::{conversation, conversation_participant},
    repositories::{ConversationRepository, UserRepository},
};

/// Conversation resolution service.
#[derive(Clone)]
pub struct ConversationService {
    conversation_repo: ConversationRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl ConversationService {
    /// Create a new conversation service.
    #[must_use]
    pub const fn new(conversation_repo: ConversationRepository, user_repo: UserRepository) -> Self {
        Self {
            conversation_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Return the conversation between the two users, creating it on first
    /// contact.
    ///
    /// Symmetric in its arguments and idempotent: repeated calls for the
    /// same pair, in either order, return the same conversation.
    pub async fn resolve_or_create(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<conversation::Model> {
        if user_a == user_b {
            return Err(AppError::BadRequest(
                "Cannot open a conversation with yourself".to_string(),
            ));
        }

        // Both participants must resolve before anything is created.
        self.user_repo.get_by_id(user_a).await?;
        self.user_repo.get_by_id(user_b).await?;

        let conversation = self
            .conversation_repo
            .resolve_or_create(user_a, user_b, &self.id_gen.generate())
            .await?;

        tracing::debug!(
            conversation = %conversation.id,
            pair = %conversation.pair_key,
            "Resolved conversation"
        );

        Ok(conversation)
    }

    /// Get a conversation by ID, erroring if absent.
    pub async fn get(&self, id: &str) -> AppResult<conversation::Model> {
        self.conversation_repo.get_by_id(id).await
    }

    /// Participants of a conversation.
    pub async fn participants(
        &self,
        conversation_id: &str,
    ) -> AppResult<Vec<conversation_participant::Model>> {
        self.conversation_repo.participants(conversation_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_self_conversation_is_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = ConversationService::new(
            ConversationRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
        );

        let result = service.resolve_or_create("alice", "alice").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected() {
        // First user lookup returns nothing.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<mutuelle_db::entities::user::Model>::new()])
                .into_connection(),
        );
        let service = ConversationService::new(
            ConversationRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
        );

        let result = service.resolve_or_create("ghost", "bob").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }
}
