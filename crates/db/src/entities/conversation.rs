//! Conversation entity for two-party message threads.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conversation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Canonical identifier for the unordered participant pair.
    ///
    /// Always `"{lowest_user_id}:{highest_user_id}"`, backed by a unique
    /// index so two concurrent resolve calls cannot create two
    /// conversations for the same pair.
    #[sea_orm(unique)]
    pub pair_key: String,

    pub created_at: DateTimeWithTimeZone,

    /// Touched whenever a message is inserted into the conversation.
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::conversation_participant::Entity")]
    Participants,

    #[sea_orm(has_many = "super::message::Entity")]
    Messages,
}

impl Related<super::conversation_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Canonical pair key for two user IDs, independent of argument order.
#[must_use]
pub fn pair_key(user_a: &str, user_b: &str) -> String {
    if user_a <= user_b {
        format!("{user_a}:{user_b}")
    } else {
        format!("{user_b}:{user_a}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_symmetric() {
        assert_eq!(pair_key("alice", "bob"), pair_key("bob", "alice"));
    }

    #[test]
    fn test_pair_key_sorts_ids() {
        assert_eq!(pair_key("bob", "alice"), "alice:bob");
        assert_eq!(pair_key("alice", "bob"), "alice:bob");
    }
}
