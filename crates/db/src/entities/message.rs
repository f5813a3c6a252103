//! Message entity for direct messages inside a conversation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum MessageKind {
    #[sea_orm(string_value = "notification")]
    Notification,
    #[sea_orm(string_value = "alert")]
    Alert,
    #[sea_orm(string_value = "message")]
    Message,
    /// Accompanies a bon de soin.
    #[sea_orm(string_value = "care_voucher")]
    CareVoucher,
    #[sea_orm(string_value = "document")]
    Document,
}

impl Default for MessageKind {
    fn default() -> Self {
        Self::Message
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub conversation_id: String,

    /// Sender user ID
    #[sea_orm(indexed)]
    pub sender_id: String,

    /// Recipient user ID
    #[sea_orm(indexed)]
    pub recipient_id: String,

    #[sea_orm(nullable)]
    pub title: Option<String>,

    /// Message body
    #[sea_orm(column_type = "Text")]
    pub text: String,

    pub kind: MessageKind,

    /// Has the recipient read this message?
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    /// Non-null exactly when `is_read` is true.
    #[sea_orm(nullable)]
    pub read_at: Option<DateTimeWithTimeZone>,

    /// Set once at insertion, never mutated.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::conversation::Entity",
        from = "Column::ConversationId",
        to = "super::conversation::Column::Id",
        on_delete = "Cascade"
    )]
    Conversation,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id"
    )]
    Sender,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id"
    )]
    Recipient,

    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachments,
}

impl Related<super::conversation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conversation.def()
    }
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
