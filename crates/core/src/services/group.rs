//! Communication group service.

use chrono::Utc;
use mutuelle_common::{AppError, AppResult, IdGenerator, MessagingConfig};
use mutuelle_db::{
    entities::{
        attachment,
        communication_group::{self, GroupKind},
        group_member,
        group_message,
        message::MessageKind,
    },
    repositories::{GroupRepository, UserRepository},
};
use sea_orm::Set;

use crate::services::{
    attachments::{AttachmentParent, AttachmentUpload, store_uploads, validate_uploads},
    storage::StorageService,
};

/// Input for creating a group.
pub struct CreateGroupInput {
    pub name: String,
    pub description: Option<String>,
    pub kind: GroupKind,
    pub is_public: bool,
    pub access_code: Option<String>,
}

/// Input for posting a message to a group.
pub struct CreateGroupMessageInput {
    pub title: Option<String>,
    pub text: String,
    pub kind: MessageKind,
    pub is_important: bool,
    pub attachments: Vec<AttachmentUpload>,
}

impl CreateGroupMessageInput {
    /// Plain group message with just a body.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            title: None,
            text: text.into(),
            kind: MessageKind::Message,
            is_important: false,
            attachments: Vec::new(),
        }
    }
}

/// A group message as persisted, with its attachments.
pub struct PostedGroupMessage {
    pub message: group_message::Model,
    pub attachments: Vec<attachment::Model>,
}

/// Group service.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    user_repo: UserRepository,
    storage: StorageService,
    config: MessagingConfig,
    id_gen: IdGenerator,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub const fn new(
        group_repo: GroupRepository,
        user_repo: UserRepository,
        storage: StorageService,
        config: MessagingConfig,
    ) -> Self {
        Self {
            group_repo,
            user_repo,
            storage,
            config,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a group; the creator becomes its first member.
    ///
    /// Group names are unique, case-sensitively.
    pub async fn create_group(
        &self,
        creator_id: &str,
        input: CreateGroupInput,
    ) -> AppResult<communication_group::Model> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation("Group name is required".to_string()));
        }

        self.user_repo.get_by_id(creator_id).await?;

        if self.group_repo.find_by_name(&input.name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Group name already taken: {}",
                input.name
            )));
        }

        let now = Utc::now();
        let group_id = self.id_gen.generate();

        let group = communication_group::ActiveModel {
            id: Set(group_id.clone()),
            name: Set(input.name),
            description: Set(input.description),
            kind: Set(input.kind),
            creator_id: Set(creator_id.to_string()),
            is_active: Set(true),
            is_public: Set(input.is_public),
            access_code: Set(input.access_code),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let creator = group_member::ActiveModel {
            group_id: Set(group_id),
            user_id: Set(creator_id.to_string()),
            joined_at: Set(now.into()),
        };

        let group = self.group_repo.create_with_creator(group, creator).await?;

        tracing::info!(group = %group.id, creator = %creator_id, "Group created");

        Ok(group)
    }

    /// Get a group by ID, erroring if absent.
    pub async fn get(&self, group_id: &str) -> AppResult<communication_group::Model> {
        self.group_repo.get_by_id(group_id).await
    }

    /// Add a user to a group. Idempotent: adding an existing member is a
    /// no-op. Returns true when the membership was actually created.
    pub async fn add_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        self.group_repo.get_by_id(group_id).await?;
        self.user_repo.get_by_id(user_id).await?;

        self.group_repo.add_member(group_id, user_id).await
    }

    /// Remove a user from a group. Idempotent: removing a non-member is a
    /// no-op. Returns true when a membership was actually deleted.
    pub async fn remove_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        self.group_repo.get_by_id(group_id).await?;

        self.group_repo.remove_member(group_id, user_id).await
    }

    /// Current members of a group.
    pub async fn list_members(&self, group_id: &str) -> AppResult<Vec<group_member::Model>> {
        self.group_repo.get_by_id(group_id).await?;
        self.group_repo.list_members(group_id).await
    }

    /// Active groups a user belongs to.
    pub async fn joined_groups(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<communication_group::Model>> {
        self.group_repo
            .find_joined_by_user(user_id, limit, offset)
            .await
    }

    /// Post a message to a group.
    ///
    /// When `messaging.enforce_group_membership` is on, the sender must be a
    /// current member; by default any valid user may post, which keeps
    /// system and admin broadcasts possible.
    pub async fn post_group_message(
        &self,
        group_id: &str,
        sender_id: &str,
        input: CreateGroupMessageInput,
    ) -> AppResult<PostedGroupMessage> {
        if input.text.trim().is_empty() {
            return Err(AppError::Validation("Message body is required".to_string()));
        }

        validate_uploads(&self.config, &input.attachments)?;

        let group = self.group_repo.get_by_id(group_id).await?;

        if !group.is_active {
            return Err(AppError::BadRequest(format!(
                "Group is deactivated: {group_id}"
            )));
        }

        self.user_repo.get_by_id(sender_id).await?;

        if self.config.enforce_group_membership
            && !self.group_repo.is_member(group_id, sender_id).await?
        {
            return Err(AppError::Forbidden(
                "Sender is not a member of the group".to_string(),
            ));
        }

        let message_id = self.id_gen.generate();

        let attachment_models = store_uploads(
            &self.storage,
            &self.id_gen,
            &AttachmentParent::GroupMessage(message_id.clone()),
            input.attachments,
        )
        .await?;

        let model = group_message::ActiveModel {
            id: Set(message_id),
            group_id: Set(group_id.to_string()),
            sender_id: Set(sender_id.to_string()),
            title: Set(input.title),
            text: Set(input.text),
            kind: Set(input.kind),
            is_important: Set(input.is_important),
            created_at: Set(Utc::now().into()),
        };

        let (message, attachments) = self
            .group_repo
            .create_message_with_attachments(model, attachment_models)
            .await?;

        tracing::info!(
            message = %message.id,
            group = %group_id,
            sender = %sender_id,
            "Group message posted"
        );

        Ok(PostedGroupMessage {
            message,
            attachments,
        })
    }

    /// Group messages visible to a member.
    ///
    /// Visibility is evaluated against the membership at read time, not a
    /// snapshot taken when the message was posted: users added later see the
    /// whole history, removed users see nothing.
    pub async fn messages_for_member(
        &self,
        group_id: &str,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<group_message::Model>> {
        self.group_repo.get_by_id(group_id).await?;

        if !self.group_repo.is_member(group_id, user_id).await? {
            return Err(AppError::Forbidden(
                "Only current members can read group messages".to_string(),
            ));
        }

        self.group_repo.find_messages(group_id, limit, until_id).await
    }

    /// Toggle the important flag on a group message.
    pub async fn set_important(
        &self,
        group_message_id: &str,
        is_important: bool,
    ) -> AppResult<group_message::Model> {
        self.group_repo
            .set_message_important(group_message_id, is_important)
            .await
    }

    /// Deactivate a group. Messages and membership are kept.
    pub async fn deactivate(&self, group_id: &str) -> AppResult<communication_group::Model> {
        let group = self.group_repo.deactivate(group_id).await?;

        tracing::info!(group = %group.id, "Group deactivated");

        Ok(group)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mutuelle_common::NoOpStorage;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service_on(db: Arc<DatabaseConnection>) -> GroupService {
        GroupService::new(
            GroupRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
            StorageService::new(Arc::new(NoOpStorage)),
            MessagingConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_group_name_is_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service_on(db);

        let result = service
            .create_group(
                "carol",
                CreateGroupInput {
                    name: "  ".to_string(),
                    description: None,
                    kind: GroupKind::Team,
                    is_public: false,
                    access_code: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_empty_post_body_is_rejected() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service_on(db);

        let result = service
            .post_group_message("grp1", "carol", CreateGroupMessageInput::text(""))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
