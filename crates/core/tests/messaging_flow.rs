//! End-to-end messaging scenarios.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test messaging_flow -- --ignored`
//!
//! Each test provisions its own uniquely-named database so they can run in
//! parallel; see `mutuelle_db::test_utils` for the environment variables.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use mutuelle_common::{AppError, MessagingConfig, NoOpStorage};
use mutuelle_core::{
    AttachmentUpload, ConversationService, CreateGroupInput, CreateGroupMessageInput,
    CreateMessageInput, CreateNotificationInput, DashboardService, GroupService, MessagingService,
    NoBenefits, NotificationService, StorageService,
};
use mutuelle_db::{
    entities::{
        communication_group::GroupKind,
        notification::NotificationKind,
        user::{self, UserRole},
    },
    repositories::{
        AttachmentRepository, ConversationRepository, GroupRepository, MessageRepository,
        NotificationRepository, UserRepository,
    },
    test_utils::TestDatabase,
};
use sea_orm::Set;

struct TestContext {
    test_db: TestDatabase,
    users: UserRepository,
    conversations: ConversationService,
    messaging: MessagingService,
    notifications: NotificationService,
    groups: GroupService,
    dashboard: DashboardService,
}

async fn setup() -> TestContext {
    setup_with_config(MessagingConfig::default()).await
}

async fn setup_with_config(config: MessagingConfig) -> TestContext {
    let test_db = TestDatabase::create_unique()
        .await
        .expect("Failed to create test database");
    mutuelle_db::migrate(test_db.connection())
        .await
        .expect("Migrations failed");

    // `DatabaseConnection` is not `Clone` when sea-orm's `mock` feature is
    // enabled (it is, for the unit tests), so acquire an owned connection to
    // the same test database rather than cloning the borrowed handle.
    let db = Arc::new(
        sea_orm::Database::connect(test_db.config.database_url())
            .await
            .expect("Failed to connect to test database"),
    );
    let storage = StorageService::new(Arc::new(NoOpStorage));

    let users = UserRepository::new(Arc::clone(&db));
    let conversation_repo = ConversationRepository::new(Arc::clone(&db));
    let conversations = ConversationService::new(conversation_repo.clone(), users.clone());
    let messaging = MessagingService::new(
        MessageRepository::new(Arc::clone(&db)),
        AttachmentRepository::new(Arc::clone(&db)),
        conversation_repo,
        conversations.clone(),
        storage.clone(),
        config.clone(),
    );
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let notifications = NotificationService::new(notification_repo.clone(), users.clone());
    let groups = GroupRepository::new(Arc::clone(&db));
    let groups = GroupService::new(groups, users.clone(), storage, config);
    let dashboard = DashboardService::new(notification_repo, Arc::new(NoBenefits));

    TestContext {
        test_db,
        users,
        conversations,
        messaging,
        notifications,
        groups,
        dashboard,
    }
}

async fn seed_user(users: &UserRepository, id: &str, username: &str) -> user::Model {
    users
        .create(user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(username.to_string()),
            username_lower: Set(username.to_lowercase()),
            name: Set(None),
            role: Set(UserRole::Member),
            token: Set(Some(format!("tok_{id}"))),
            created_at: Set(Utc::now().into()),
        })
        .await
        .expect("Failed to seed user")
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_first_contact_creates_one_conversation() {
    let ctx = setup().await;
    seed_user(&ctx.users, "alice", "alice").await;
    seed_user(&ctx.users, "bob", "bob").await;

    let sent = ctx
        .messaging
        .send_message("alice", "bob", CreateMessageInput::text("Hello"))
        .await
        .unwrap();

    assert_eq!(sent.message.sender_id, "alice");
    assert_eq!(sent.message.recipient_id, "bob");
    assert!(!sent.message.is_read);
    assert!(sent.message.read_at.is_none());

    let participants = ctx
        .conversations
        .participants(&sent.message.conversation_id)
        .await
        .unwrap();
    let mut ids: Vec<&str> = participants.iter().map(|p| p.user_id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, ["alice", "bob"]);

    assert_eq!(ctx.messaging.unread_count("bob").await.unwrap(), 1);
    assert_eq!(ctx.messaging.unread_count("alice").await.unwrap(), 0);

    ctx.test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_reply_reuses_the_conversation() {
    let ctx = setup().await;
    seed_user(&ctx.users, "alice", "alice").await;
    seed_user(&ctx.users, "bob", "bob").await;

    let first = ctx
        .messaging
        .send_message("alice", "bob", CreateMessageInput::text("Hello"))
        .await
        .unwrap();
    let reply = ctx
        .messaging
        .send_message("bob", "alice", CreateMessageInput::text("Hi"))
        .await
        .unwrap();

    // Symmetric resolution: the reply lands in the same conversation.
    assert_eq!(first.message.conversation_id, reply.message.conversation_id);

    let summaries = ctx
        .messaging
        .conversations_for_user("alice", None)
        .await
        .unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].message_count, 2);
    assert_eq!(summaries[0].partner_id, "bob");
    assert_eq!(summaries[0].unread_count, 1);

    assert_eq!(ctx.messaging.unread_count("alice").await.unwrap(), 1);

    ctx.test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_mark_read_clears_unread_and_stamps_timestamp() {
    let ctx = setup().await;
    seed_user(&ctx.users, "alice", "alice").await;
    seed_user(&ctx.users, "bob", "bob").await;

    ctx.messaging
        .send_message("alice", "bob", CreateMessageInput::text("Hello"))
        .await
        .unwrap();
    let reply = ctx
        .messaging
        .send_message("bob", "alice", CreateMessageInput::text("Hi"))
        .await
        .unwrap();

    let read = ctx
        .messaging
        .mark_read("alice", &reply.message.id)
        .await
        .unwrap();

    assert!(read.is_read);
    let read_at = read.read_at.unwrap();
    assert!(read_at >= read.created_at);
    assert_eq!(ctx.messaging.unread_count("alice").await.unwrap(), 0);

    // Idempotent: a second call leaves the timestamp untouched.
    let again = ctx
        .messaging
        .mark_read("alice", &reply.message.id)
        .await
        .unwrap();
    assert_eq!(again.read_at.unwrap(), read_at);

    // And unread flips the state back.
    let unread = ctx
        .messaging
        .mark_unread("alice", &reply.message.id)
        .await
        .unwrap();
    assert!(!unread.is_read);
    assert!(unread.read_at.is_none());
    assert_eq!(ctx.messaging.unread_count("alice").await.unwrap(), 1);

    ctx.test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_resolution_is_deterministic_and_symmetric() {
    let ctx = setup().await;
    seed_user(&ctx.users, "alice", "alice").await;
    seed_user(&ctx.users, "bob", "bob").await;

    let first = ctx.conversations.resolve_or_create("alice", "bob").await.unwrap();
    let second = ctx.conversations.resolve_or_create("alice", "bob").await.unwrap();
    let flipped = ctx.conversations.resolve_or_create("bob", "alice").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.id, flipped.id);

    ctx.test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_oversized_attachment_rolls_back_everything() {
    let config = MessagingConfig {
        max_attachment_size: 1024,
        ..MessagingConfig::default()
    };
    let ctx = setup_with_config(config).await;
    seed_user(&ctx.users, "alice", "alice").await;
    seed_user(&ctx.users, "bob", "bob").await;

    let input = CreateMessageInput {
        title: None,
        text: "Dossier complet".to_string(),
        kind: mutuelle_db::entities::message::MessageKind::Document,
        attachments: vec![
            AttachmentUpload {
                file_name: "ok.pdf".to_string(),
                data: vec![0u8; 100],
            },
            AttachmentUpload {
                file_name: "trop_gros.pdf".to_string(),
                data: vec![0u8; 4096],
            },
        ],
    };

    let result = ctx.messaging.send_message("alice", "bob", input).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Nothing was persisted: no message, no conversation either.
    assert_eq!(ctx.messaging.unread_count("bob").await.unwrap(), 0);
    let summaries = ctx
        .messaging
        .conversations_for_user("alice", None)
        .await
        .unwrap();
    assert!(summaries.is_empty());

    ctx.test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_attachments_are_categorized_and_sized() {
    let ctx = setup().await;
    seed_user(&ctx.users, "alice", "alice").await;
    seed_user(&ctx.users, "bob", "bob").await;

    let input = CreateMessageInput {
        title: Some("Resultats".to_string()),
        text: "Voir pieces jointes".to_string(),
        kind: mutuelle_db::entities::message::MessageKind::Document,
        attachments: vec![
            AttachmentUpload {
                file_name: "analyse.PDF".to_string(),
                data: vec![0u8; 256],
            },
            AttachmentUpload {
                file_name: "radio.jpeg".to_string(),
                data: vec![0u8; 512],
            },
        ],
    };

    let sent = ctx.messaging.send_message("alice", "bob", input).await.unwrap();

    assert_eq!(sent.attachments.len(), 2);
    use mutuelle_db::entities::attachment::FileCategory;
    let pdf = sent
        .attachments
        .iter()
        .find(|a| a.file_name == "analyse.PDF")
        .unwrap();
    assert_eq!(pdf.category, FileCategory::Pdf);
    assert_eq!(pdf.size, 256);
    let image = sent
        .attachments
        .iter()
        .find(|a| a.file_name == "radio.jpeg")
        .unwrap();
    assert_eq!(image.category, FileCategory::Image);
    assert_eq!(image.size, 512);

    ctx.test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_group_membership_and_fan_out() {
    let ctx = setup().await;
    seed_user(&ctx.users, "carol", "carol").await;
    seed_user(&ctx.users, "dave", "dave").await;

    let group = ctx
        .groups
        .create_group(
            "carol",
            CreateGroupInput {
                name: "Support".to_string(),
                description: None,
                kind: GroupKind::Team,
                is_public: false,
                access_code: None,
            },
        )
        .await
        .unwrap();

    assert!(ctx.groups.add_member(&group.id, "dave").await.unwrap());
    // Adding twice is a no-op, not an error.
    assert!(!ctx.groups.add_member(&group.id, "dave").await.unwrap());

    let members = ctx.groups.list_members(&group.id).await.unwrap();
    assert_eq!(members.len(), 2);

    let posted = ctx
        .groups
        .post_group_message(&group.id, "dave", CreateGroupMessageInput::text("hello team"))
        .await
        .unwrap();
    assert_eq!(posted.message.sender_id, "dave");

    let messages = ctx
        .groups
        .messages_for_member(&group.id, "carol", 10, None)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);

    // Visibility follows current membership: once removed, dave sees nothing.
    assert!(ctx.groups.remove_member(&group.id, "dave").await.unwrap());
    assert!(!ctx.groups.remove_member(&group.id, "dave").await.unwrap());
    let result = ctx.groups.messages_for_member(&group.id, "dave", 10, None).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    ctx.test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_group_name_conflicts() {
    let ctx = setup().await;
    seed_user(&ctx.users, "carol", "carol").await;

    let input = || CreateGroupInput {
        name: "Support".to_string(),
        description: None,
        kind: GroupKind::Team,
        is_public: false,
        access_code: None,
    };

    ctx.groups.create_group("carol", input()).await.unwrap();
    let result = ctx.groups.create_group("carol", input()).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));

    ctx.test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_notifications_and_dashboard_accounting() {
    let ctx = setup().await;
    seed_user(&ctx.users, "bob", "bob").await;

    for (title, kind) in [
        ("Paiement recu", NotificationKind::Payment),
        ("Bon de soin valide", NotificationKind::CareVoucher),
        ("Rappel rendez-vous", NotificationKind::Appointment),
    ] {
        ctx.notifications
            .notify(
                "bob",
                CreateNotificationInput {
                    title: title.to_string(),
                    text: String::new(),
                    kind,
                },
            )
            .await
            .unwrap();
    }

    assert_eq!(ctx.notifications.count_unread("bob").await.unwrap(), 3);

    let summary = ctx.dashboard.summary("bob").await.unwrap();
    assert_eq!(summary.unread_notifications, 3);
    assert_eq!(summary.balance, 0.0);
    assert!(summary.next_appointment.is_none());

    let flipped = ctx.notifications.mark_all_read("bob").await.unwrap();
    assert_eq!(flipped, 3);
    assert_eq!(ctx.notifications.count_unread("bob").await.unwrap(), 0);

    // Nothing left to flip on the second pass.
    assert_eq!(ctx.notifications.mark_all_read("bob").await.unwrap(), 0);

    ctx.test_db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_conversations_order_by_recent_activity() {
    let ctx = setup().await;
    seed_user(&ctx.users, "alice", "alice").await;
    seed_user(&ctx.users, "bob", "bob").await;
    seed_user(&ctx.users, "carol", "carol").await;

    ctx.messaging
        .send_message("alice", "bob", CreateMessageInput::text("premier"))
        .await
        .unwrap();
    ctx.messaging
        .send_message("alice", "carol", CreateMessageInput::text("second"))
        .await
        .unwrap();

    // An empty conversation sorts on its own creation timestamp.
    seed_user(&ctx.users, "erin", "erin").await;
    ctx.conversations.resolve_or_create("alice", "erin").await.unwrap();

    let summaries = ctx
        .messaging
        .conversations_for_user("alice", None)
        .await
        .unwrap();

    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries[0].partner_id, "erin");
    assert_eq!(summaries[1].partner_id, "carol");
    assert_eq!(summaries[2].partner_id, "bob");
    assert_eq!(summaries[0].message_count, 0);

    ctx.test_db.drop_database().await.unwrap();
}
