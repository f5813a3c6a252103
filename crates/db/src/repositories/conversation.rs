//! Conversation repository.
//!
//! Owns the one cross-call invariant of the messaging core: at most one
//! conversation per unordered user pair, enforced by the unique `pair_key`
//! index plus a transactional insert.

use std::sync::Arc;

use crate::entities::{
    Conversation, ConversationParticipant, conversation, conversation_participant,
};
use chrono::Utc;
use mutuelle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
    sea_query::Expr,
};

/// Repository for conversation operations.
#[derive(Clone)]
pub struct ConversationRepository {
    db: Arc<DatabaseConnection>,
}

impl ConversationRepository {
    /// Create a new conversation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a conversation by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<conversation::Model>> {
        Conversation::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a conversation by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<conversation::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Conversation not found: {id}")))
    }

    /// Find the conversation for an unordered user pair.
    ///
    /// Ordered by id ascending so legacy duplicate rows (created before the
    /// unique pair key existed) still resolve deterministically to the
    /// oldest conversation.
    pub async fn find_by_pair(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> AppResult<Option<conversation::Model>> {
        Conversation::find()
            .filter(conversation::Column::PairKey.eq(conversation::pair_key(user_a, user_b)))
            .order_by_asc(conversation::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Return the existing conversation for the pair, or create one with the
    /// given ID and exactly `{user_a, user_b}` as participants.
    ///
    /// A concurrent call losing the insert race hits the unique pair-key
    /// violation and re-queries the winner, so both callers observe the same
    /// conversation.
    pub async fn resolve_or_create(
        &self,
        user_a: &str,
        user_b: &str,
        new_id: &str,
    ) -> AppResult<conversation::Model> {
        if let Some(existing) = self.find_by_pair(user_a, user_b).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let model = conversation::ActiveModel {
            id: Set(new_id.to_string()),
            pair_key: Set(conversation::pair_key(user_a, user_b)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        match model.insert(&txn).await {
            Ok(created) => {
                for user_id in [user_a, user_b] {
                    let participant = conversation_participant::ActiveModel {
                        conversation_id: Set(created.id.clone()),
                        user_id: Set(user_id.to_string()),
                        joined_at: Set(now.into()),
                    };
                    participant
                        .insert(&txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                }

                txn.commit()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok(created)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                txn.rollback()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                // Lost the race: another request created the pair first.
                self.find_by_pair(user_a, user_b).await?.ok_or_else(|| {
                    AppError::Database(format!(
                        "Conversation for pair disappeared after conflict: {}",
                        conversation::pair_key(user_a, user_b)
                    ))
                })
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Conversations the user participates in.
    pub async fn find_for_user(
        &self,
        user_id: &str,
        limit: Option<u64>,
    ) -> AppResult<Vec<conversation::Model>> {
        let mut participant_query = ConversationParticipant::find()
            .filter(conversation_participant::Column::UserId.eq(user_id));

        if let Some(limit) = limit {
            participant_query = participant_query.limit(limit);
        }

        let memberships = participant_query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let conversation_ids: Vec<String> = memberships
            .into_iter()
            .map(|m| m.conversation_id)
            .collect();

        if conversation_ids.is_empty() {
            return Ok(vec![]);
        }

        Conversation::find()
            .filter(conversation::Column::Id.is_in(conversation_ids))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Participants of a conversation.
    pub async fn participants(
        &self,
        conversation_id: &str,
    ) -> AppResult<Vec<conversation_participant::Model>> {
        ConversationParticipant::find()
            .filter(conversation_participant::Column::ConversationId.eq(conversation_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Touch the conversation's modified timestamp.
    pub async fn touch(&self, id: &str) -> AppResult<()> {
        Conversation::update_many()
            .col_expr(
                conversation::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(conversation::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_conversation(id: &str, pair_key: &str) -> conversation::Model {
        conversation::Model {
            id: id.to_string(),
            pair_key: pair_key.to_string(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_pair_is_symmetric() {
        let conv = test_conversation("cnv1", "alice:bob");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[conv.clone()], [conv.clone()]])
                .into_connection(),
        );

        let repo = ConversationRepository::new(db);
        let ab = repo.find_by_pair("alice", "bob").await.unwrap().unwrap();
        let ba = repo.find_by_pair("bob", "alice").await.unwrap().unwrap();

        assert_eq!(ab.id, ba.id);
    }

    #[tokio::test]
    async fn test_resolve_returns_existing_without_insert() {
        let conv = test_conversation("cnv1", "alice:bob");

        // Only a query result is appended; an insert attempt would error.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[conv]])
                .into_connection(),
        );

        let repo = ConversationRepository::new(db);
        let resolved = repo.resolve_or_create("alice", "bob", "cnv2").await.unwrap();

        assert_eq!(resolved.id, "cnv1");
    }
}
