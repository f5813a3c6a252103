//! Attachment entity (pieces jointes on messages and group messages).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// File category, derived from the file-name extension at save time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum FileCategory {
    #[sea_orm(string_value = "pdf")]
    Pdf,
    #[sea_orm(string_value = "image")]
    Image,
    #[sea_orm(string_value = "document")]
    Document,
    #[sea_orm(string_value = "other")]
    Other,
}

impl FileCategory {
    /// Classify a file by its extension, case-insensitively.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Self::Pdf,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" => Self::Image,
            "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" => Self::Document,
            _ => Self::Other,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attachment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Parent direct message (exactly one of the two parents is set).
    #[sea_orm(nullable, indexed)]
    pub message_id: Option<String>,

    /// Parent group message.
    #[sea_orm(nullable, indexed)]
    pub group_message_id: Option<String>,

    /// Original file name as uploaded
    pub file_name: String,

    /// Key within the storage backend
    pub storage_key: String,

    /// Public URL to the stored file
    pub url: String,

    pub category: FileCategory,

    /// Size in bytes, computed from the stored content at creation
    pub size: i64,

    #[sea_orm(default_value = true)]
    pub is_valid: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::message::Entity",
        from = "Column::MessageId",
        to = "super::message::Column::Id",
        on_delete = "Cascade"
    )]
    Message,

    #[sea_orm(
        belongs_to = "super::group_message::Entity",
        from = "Column::GroupMessageId",
        to = "super::group_message::Column::Id",
        on_delete = "Cascade"
    )]
    GroupMessage,
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Message.def()
    }
}

impl Related<super::group_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupMessage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_pdf_any_case() {
        assert_eq!(FileCategory::from_file_name("report.PDF"), FileCategory::Pdf);
        assert_eq!(FileCategory::from_file_name("report.pdf"), FileCategory::Pdf);
    }

    #[test]
    fn test_classify_image() {
        assert_eq!(FileCategory::from_file_name("photo.jpeg"), FileCategory::Image);
        assert_eq!(FileCategory::from_file_name("scan.PNG"), FileCategory::Image);
        assert_eq!(FileCategory::from_file_name("x.webp"), FileCategory::Image);
    }

    #[test]
    fn test_classify_document() {
        assert_eq!(FileCategory::from_file_name("devis.docx"), FileCategory::Document);
        assert_eq!(FileCategory::from_file_name("tableau.xls"), FileCategory::Document);
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(FileCategory::from_file_name("notes.unknownext"), FileCategory::Other);
        assert_eq!(FileCategory::from_file_name("no_extension"), FileCategory::Other);
    }
}
