//! Notification service.
//!
//! Any collaborator (payment service, voucher service, appointment
//! scheduling) creates notifications through the same contract; no caller
//! is privileged.

use chrono::Utc;
use mutuelle_common::{AppError, AppResult, IdGenerator};
use mutuelle_db::{
    entities::notification::{self, NotificationKind},
    repositories::{NotificationRepository, UserRepository},
};
use sea_orm::Set;

/// Input for creating a notification.
pub struct CreateNotificationInput {
    pub title: String,
    pub text: String,
    pub kind: NotificationKind,
}

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository, user_repo: UserRepository) -> Self {
        Self {
            notification_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a notification addressed to one user.
    pub async fn notify(
        &self,
        user_id: &str,
        input: CreateNotificationInput,
    ) -> AppResult<notification::Model> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation(
                "Notification title is required".to_string(),
            ));
        }

        self.user_repo.get_by_id(user_id).await?;

        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            title: Set(input.title),
            text: Set(input.text),
            kind: Set(input.kind),
            is_read: Set(false),
            read_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        let notification = self.notification_repo.create(model).await?;

        tracing::debug!(
            notification = %notification.id,
            user = %user_id,
            "Notification created"
        );

        Ok(notification)
    }

    /// Get notifications for a user.
    pub async fn list(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_user(user_id, limit, until_id, unread_only)
            .await
    }

    /// Mark a notification as read. Idempotent.
    pub async fn mark_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> AppResult<notification::Model> {
        let notification = self.notification_repo.get_by_id(notification_id).await?;

        if notification.user_id != user_id {
            return Err(AppError::Forbidden(
                "Cannot mark another user's notification".to_string(),
            ));
        }

        self.notification_repo.mark_read(notification_id).await
    }

    /// Mark a notification as unread. Idempotent.
    pub async fn mark_unread(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> AppResult<notification::Model> {
        let notification = self.notification_repo.get_by_id(notification_id).await?;

        if notification.user_id != user_id {
            return Err(AppError::Forbidden(
                "Cannot mark another user's notification".to_string(),
            ));
        }

        self.notification_repo.mark_unread(notification_id).await
    }

    /// Mark every unread notification of a user as read.
    ///
    /// Returns the number of rows flipped; 0 when none were unread.
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_read(user_id).await
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }
}
