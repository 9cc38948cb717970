use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of stored file, derived from the original extension on upload.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
    Txt,
    Xlsx,
    Image,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => FileKind::Pdf,
            "doc" | "docx" => FileKind::Docx,
            "xls" | "xlsx" => FileKind::Xlsx,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" => FileKind::Image,
            _ => FileKind::Txt,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Completed,
    Failed,
}

/// A stored file: either a plain upload or a generated document.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema, sqlx::FromRow)]
pub struct FileRecord {
    #[schema(example = "a1b2c3d4-e5f6-7890-1234-567890abcdef")]
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Proposal_12-2024.pdf")]
    pub file_name: String,
    pub file_type: FileKind,
    pub file_size: i64,
    #[schema(example = "Proposals 2026/Proposal_12-2024.pdf")]
    pub file_path: String,
    pub folder_id: Option<Uuid>,
    /// Source template for generated documents; nulled when the template is
    /// deleted, never cascaded.
    pub template_id: Option<Uuid>,
    pub description: Option<String>,
    pub is_generated: bool,
    pub status: FileStatus,
    /// Context snapshot used to generate the document; empty object for
    /// plain uploads.
    #[schema(value_type = Object)]
    pub data_used: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn uploaded(
        owner_id: Uuid,
        file_name: String,
        file_type: FileKind,
        file_size: i64,
        file_path: String,
        folder_id: Option<Uuid>,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            file_name,
            file_type,
            file_size,
            file_path,
            folder_id,
            template_id: None,
            description,
            is_generated: false,
            status: FileStatus::Completed,
            data_used: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn generated(
        owner_id: Uuid,
        file_name: String,
        file_size: i64,
        file_path: String,
        folder_id: Uuid,
        template_id: Uuid,
        data_used: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            file_name,
            file_type: FileKind::Pdf,
            file_size,
            file_path,
            folder_id: Some(folder_id),
            template_id: Some(template_id),
            description: None,
            is_generated: true,
            status: FileStatus::Completed,
            data_used,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(FileKind::from_extension("PDF"), FileKind::Pdf);
        assert_eq!(FileKind::from_extension("docx"), FileKind::Docx);
        assert_eq!(FileKind::from_extension("doc"), FileKind::Docx);
        assert_eq!(FileKind::from_extension("xlsx"), FileKind::Xlsx);
        assert_eq!(FileKind::from_extension("jpeg"), FileKind::Image);
        assert_eq!(FileKind::from_extension("weird"), FileKind::Txt);
    }

    #[test]
    fn test_generated_record_defaults() {
        let record = FileRecord::generated(
            Uuid::new_v4(),
            "Proposal_new.pdf".to_string(),
            1024,
            "Proposals/Proposal_new.pdf".to_string(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            serde_json::json!({"client_name": "Ana"}),
        );
        assert!(record.is_generated);
        assert_eq!(record.status, FileStatus::Completed);
        assert_eq!(record.file_type, FileKind::Pdf);
        assert!(record.template_id.is_some());
    }
}
