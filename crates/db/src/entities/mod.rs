//! Database entities.

pub mod attachment;
pub mod communication_group;
pub mod conversation;
pub mod conversation_participant;
pub mod group_member;
pub mod group_message;
pub mod message;
pub mod notification;
pub mod user;

pub use attachment::Entity as Attachment;
pub use communication_group::Entity as CommunicationGroup;
pub use conversation::Entity as Conversation;
pub use conversation_participant::Entity as ConversationParticipant;
pub use group_member::Entity as GroupMember;
pub use group_message::Entity as GroupMessage;
pub use message::Entity as Message;
pub use notification::Entity as Notification;
pub use user::Entity as User;
