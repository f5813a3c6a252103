//! Business logic services.

#![allow(missing_docs)]

pub mod attachments;
pub mod conversation;
pub mod dashboard;
pub mod group;
pub mod messaging;
pub mod notification;
pub mod storage;

pub use attachments::AttachmentUpload;
pub use conversation::ConversationService;
pub use dashboard::{BenefitsProvider, DashboardService, DashboardSummary, NoBenefits, VoucherCounts};
pub use group::{CreateGroupInput, CreateGroupMessageInput, GroupService, PostedGroupMessage};
pub use messaging::{ConversationSummary, CreateMessageInput, MessagingService, SentMessage};
pub use notification::{CreateNotificationInput, NotificationService};
pub use storage::StorageService;
