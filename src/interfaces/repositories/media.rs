use async_trait::async_trait;
use sqlx::{types::Json, PgPool};

use crate::{
    entities::media::{MediaAsset, MediaAssetInsert, MediaAssetRow},
    errors::AppError,
    repositories::sqlx_repo::SqlxMediaRepo,
};

const MEDIA_COLUMNS: &str = "id, user_id, parent_id, file_name, mime_type, file_size, width, height, \
    thumbnail_file_name, generation, created_at";

#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn get_asset(&self, id: i64) -> Result<Option<MediaAsset>, AppError>;
    async fn find_by_file_name(&self, file_name: &str) -> Result<Option<MediaAsset>, AppError>;
    /// Inserts the asset together with its generation metadata in one statement.
    async fn insert_asset(&self, asset: &MediaAssetInsert) -> Result<MediaAsset, AppError>;
}

impl SqlxMediaRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxMediaRepo { pool }
    }
}

#[async_trait]
impl MediaRepository for SqlxMediaRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn get_asset(&self, id: i64) -> Result<Option<MediaAsset>, AppError> {
        let row = sqlx::query_as::<_, MediaAssetRow>(&format!(
            "SELECT {} FROM media_assets WHERE id = $1",
            MEDIA_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MediaAsset::from))
    }

    async fn find_by_file_name(&self, file_name: &str) -> Result<Option<MediaAsset>, AppError> {
        let row = sqlx::query_as::<_, MediaAssetRow>(&format!(
            "SELECT {} FROM media_assets WHERE file_name = $1",
            MEDIA_COLUMNS
        ))
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MediaAsset::from))
    }

    async fn insert_asset(&self, asset: &MediaAssetInsert) -> Result<MediaAsset, AppError> {
        let row = sqlx::query_as::<_, MediaAssetRow>(&format!(
            r#"
            INSERT INTO media_assets (
                user_id, parent_id, file_name, mime_type, file_size,
                width, height, thumbnail_file_name, generation
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            MEDIA_COLUMNS
        ))
        .bind(asset.user_id)
        .bind(asset.parent_id)
        .bind(&asset.file_name)
        .bind(&asset.mime_type)
        .bind(asset.file_size)
        .bind(asset.width)
        .bind(asset.height)
        .bind(&asset.thumbnail_file_name)
        .bind(asset.generation.as_ref().map(Json))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}
