//! Group message entity.
//!
//! There is no recipient snapshot: a group message is visible to whoever is
//! a member of the group at read time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::message::MessageKind;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group_message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub group_id: String,

    /// Sender user ID
    #[sea_orm(indexed)]
    pub sender_id: String,

    #[sea_orm(nullable)]
    pub title: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub text: String,

    pub kind: MessageKind,

    /// Togglable after creation.
    #[sea_orm(default_value = false)]
    pub is_important: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::communication_group::Entity",
        from = "Column::GroupId",
        to = "super::communication_group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id"
    )]
    Sender,

    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachments,
}

impl Related<super::communication_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
