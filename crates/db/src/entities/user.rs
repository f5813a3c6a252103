//! User entity.
//!
//! Identity records are owned by the external auth collaborator; the
//! messaging core only reads them and holds foreign keys into this table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a user within the mutuelle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum UserRole {
    /// Insured member (adherent).
    #[sea_orm(string_value = "member")]
    Member,
    /// Back-office agent.
    #[sea_orm(string_value = "agent")]
    Agent,
    /// Practitioner issuing prescriptions.
    #[sea_orm(string_value = "doctor")]
    Doctor,
    /// Pharmacist serving care vouchers.
    #[sea_orm(string_value = "pharmacist")]
    Pharmacist,
    /// Insurer back-office.
    #[sea_orm(string_value = "insurer")]
    Insurer,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Member
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub username_lower: String,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    pub role: UserRole,

    /// Access token for API authentication
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,

    #[sea_orm(has_many = "super::conversation_participant::Entity")]
    ConversationParticipants,
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl Related<super::conversation_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConversationParticipants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
