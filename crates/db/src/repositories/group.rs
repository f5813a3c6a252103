//! Communication group repository.

use std::sync::Arc;

use chrono::Utc;
use mutuelle_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{
    CommunicationGroup, GroupMember, GroupMessage, attachment, communication_group, group_member,
    group_message,
};

/// Repository for group operations.
#[derive(Clone)]
pub struct GroupRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ==================== Group Operations ====================

    /// Find group by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<communication_group::Model>> {
        CommunicationGroup::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get group by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<communication_group::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group not found: {id}")))
    }

    /// Find a group by exact name (case-sensitive, matching the unique key).
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<communication_group::Model>> {
        CommunicationGroup::find()
            .filter(communication_group::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a group and its creator membership in one transaction.
    pub async fn create_with_creator(
        &self,
        group: communication_group::ActiveModel,
        creator: group_member::ActiveModel,
    ) -> AppResult<communication_group::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let group = group
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        creator
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(group)
    }

    /// Update a group.
    pub async fn update(
        &self,
        model: communication_group::ActiveModel,
    ) -> AppResult<communication_group::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Deactivate a group (soft delete); messages and membership survive.
    pub async fn deactivate(&self, id: &str) -> AppResult<communication_group::Model> {
        let group = self.get_by_id(id).await?;
        let mut active: communication_group::ActiveModel = group.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find active groups a user is a member of.
    pub async fn find_joined_by_user(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<communication_group::Model>> {
        let memberships = GroupMember::find()
            .filter(group_member::Column::UserId.eq(user_id))
            .order_by(group_member::Column::JoinedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let group_ids: Vec<String> = memberships.iter().map(|m| m.group_id.clone()).collect();

        if group_ids.is_empty() {
            return Ok(vec![]);
        }

        CommunicationGroup::find()
            .filter(communication_group::Column::Id.is_in(group_ids))
            .filter(communication_group::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Member Operations ====================

    /// Check if user is a member of a group.
    pub async fn is_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let count = GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .filter(group_member::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Add a member to a group.
    ///
    /// Idempotent set semantics: adding an existing member is a no-op, not
    /// an error. Returns true when a row was actually inserted.
    pub async fn add_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        if self.is_member(group_id, user_id).await? {
            return Ok(false);
        }

        let member = group_member::ActiveModel {
            group_id: Set(group_id.to_string()),
            user_id: Set(user_id.to_string()),
            joined_at: Set(Utc::now().into()),
        };

        match member.insert(self.db.as_ref()).await {
            Ok(_) => Ok(true),
            // A concurrent add of the same member hits the composite PK;
            // still a no-op for set semantics.
            Err(e)
                if matches!(
                    e.sql_err(),
                    Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
                ) =>
            {
                Ok(false)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Remove a member from a group.
    ///
    /// Idempotent: removing a non-member is a no-op. Returns true when a row
    /// was actually deleted.
    pub async fn remove_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let deleted = GroupMember::delete_many()
            .filter(group_member::Column::GroupId.eq(group_id))
            .filter(group_member::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(deleted.rows_affected > 0)
    }

    /// List members of a group, oldest first.
    pub async fn list_members(&self, group_id: &str) -> AppResult<Vec<group_member::Model>> {
        GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .order_by(group_member::Column::JoinedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count members in a group.
    pub async fn count_members(&self, group_id: &str) -> AppResult<u64> {
        GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Message Operations ====================

    /// Insert a group message together with its attachments.
    ///
    /// All-or-nothing: if any insert fails, no message and no attachment row
    /// is persisted.
    pub async fn create_message_with_attachments(
        &self,
        message: group_message::ActiveModel,
        attachments: Vec<attachment::ActiveModel>,
    ) -> AppResult<(group_message::Model, Vec<attachment::Model>)> {
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

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((message, created))
    }

    /// Find a group message by ID.
    pub async fn find_message_by_id(&self, id: &str) -> AppResult<Option<group_message::Model>> {
        GroupMessage::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Messages of a group, newest first.
    pub async fn find_messages(
        &self,
        group_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<group_message::Model>> {
        let mut query = GroupMessage::find()
            .filter(group_message::Column::GroupId.eq(group_id))
            .order_by_desc(group_message::Column::CreatedAt);

        if let Some(until) = until_id
            && let Some(until_msg) = self.find_message_by_id(until).await?
        {
            query = query.filter(group_message::Column::CreatedAt.lt(until_msg.created_at));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Toggle the important flag on a group message.
    pub async fn set_message_important(
        &self,
        id: &str,
        is_important: bool,
    ) -> AppResult<group_message::Model> {
        let msg = self
            .find_message_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group message not found: {id}")))?;

        if msg.is_important == is_important {
            return Ok(msg);
        }

        let mut active: group_message::ActiveModel = msg.into();
        active.is_important = Set(is_important);

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
    use crate::entities::communication_group::GroupKind;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_group(id: &str, creator_id: &str, name: &str) -> communication_group::Model {
        communication_group::Model {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            kind: GroupKind::Team,
            creator_id: creator_id.to_string(),
            is_active: true,
            is_public: false,
            access_code: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let group = test_group("grp1", "usr1", "Support");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[group.clone()]])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);
        let result = repo.find_by_id("grp1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().name, "Support");
    }

    #[tokio::test]
    async fn test_find_by_name_is_exact() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<communication_group::Model>::new()])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);
        let result = repo.find_by_name("support").await.unwrap();

        assert!(result.is_none());
    }
}
