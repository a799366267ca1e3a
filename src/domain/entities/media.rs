use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::entities::generation::GenerationType;

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct MediaAssetRow {
    pub id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub thumbnail_file_name: Option<String>,
    pub generation: Option<Json<GenerationMetadata>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaAsset {
    pub id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub thumbnail_file_name: Option<String>,
    pub generation: Option<GenerationMetadata>,
    pub created_at: DateTime<Utc>,
}

impl From<MediaAssetRow> for MediaAsset {
    fn from(row: MediaAssetRow) -> Self {
        MediaAsset {
            id: row.id,
            user_id: row.user_id,
            parent_id: row.parent_id,
            file_name: row.file_name,
            mime_type: row.mime_type,
            file_size: row.file_size,
            width: row.width,
            height: row.height,
            thumbnail_file_name: row.thumbnail_file_name,
            generation: row.generation.map(|g| g.0),
            created_at: row.created_at,
        }
    }
}

impl MediaAsset {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaAssetInsert {
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub thumbnail_file_name: Option<String>,
    pub generation: Option<GenerationMetadata>,
}

/// Metadata stamped on every generated asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationMetadata {
    pub is_ai_generated: bool,
    pub original_image_id: i64,
    pub prompt: String,
    pub style_description: String,
    pub generation_type: GenerationType,
    pub generation_date: DateTime<Utc>,
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_kit_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_kit_name: Option<String>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MediaAssetResponse {
    pub id: i64,
    pub file_name: String,
    pub url: String,
    pub thumbnail_url: String,
    pub mime_type: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub parent_id: Option<i64>,
    pub generation: Option<GenerationMetadata>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UploadOutcome {
    pub file_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<MediaAssetResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub uploaded: usize,
    pub failed: usize,
    pub results: Vec<UploadOutcome>,
}

// ───── Input Requests ───────────────────────────────────────────────

#[derive(Debug, MultipartForm)]
pub struct MediaUploadForm {
    #[multipart(rename = "files", limit = "50MB")]
    pub files: Vec<TempFile>,
}

/// One uploaded file after the multipart layer has spooled it to disk.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub path: std::path::PathBuf,
    pub size: u64,
}
