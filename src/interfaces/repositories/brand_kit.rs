use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};

use crate::{
    entities::brand_kit::{BrandKit, BrandKitChanges, BrandKitInsert, BrandKitRow},
    errors::AppError,
    repositories::sqlx_repo::SqlxBrandKitRepo,
};

const BRAND_KIT_COLUMNS: &str =
    "id, user_id, name, colors, fonts, style_guidelines, created_at, updated_at";

#[async_trait]
pub trait BrandKitRepository: Send + Sync {
    /// Kits owned by `user_id`, newest first.
    async fn list_brand_kits(&self, user_id: i64) -> Result<Vec<BrandKit>, AppError>;
    async fn get_brand_kit(&self, id: i64) -> Result<Option<BrandKit>, AppError>;
    async fn create_brand_kit(&self, kit: &BrandKitInsert) -> Result<BrandKit, AppError>;
    async fn update_brand_kit(&self, id: i64, changes: &BrandKitChanges) -> Result<BrandKit, AppError>;
    async fn delete_brand_kit(&self, id: i64) -> Result<(), AppError>;
}

impl SqlxBrandKitRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxBrandKitRepo { pool }
    }
}

#[async_trait]
impl BrandKitRepository for SqlxBrandKitRepo {
    async fn list_brand_kits(&self, user_id: i64) -> Result<Vec<BrandKit>, AppError> {
        let rows = sqlx::query_as::<_, BrandKitRow>(&format!(
            "SELECT {} FROM brand_kits WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            BRAND_KIT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BrandKit::from).collect())
    }

    async fn get_brand_kit(&self, id: i64) -> Result<Option<BrandKit>, AppError> {
        let row = sqlx::query_as::<_, BrandKitRow>(&format!(
            "SELECT {} FROM brand_kits WHERE id = $1",
            BRAND_KIT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BrandKit::from))
    }

    async fn create_brand_kit(&self, kit: &BrandKitInsert) -> Result<BrandKit, AppError> {
        let row = sqlx::query_as::<_, BrandKitRow>(&format!(
            r#"
            INSERT INTO brand_kits (user_id, name, colors, fonts, style_guidelines)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            BRAND_KIT_COLUMNS
        ))
        .bind(kit.user_id)
        .bind(&kit.name)
        .bind(Json(&kit.colors))
        .bind(Json(&kit.fonts))
        .bind(&kit.style_guidelines)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_brand_kit(&self, id: i64, changes: &BrandKitChanges) -> Result<BrandKit, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE brand_kits SET updated_at = NOW()");

        if let Some(name) = &changes.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Some(colors) = &changes.colors {
            builder.push(", colors = ").push_bind(Json(colors));
        }
        if let Some(fonts) = &changes.fonts {
            builder.push(", fonts = ").push_bind(Json(fonts));
        }
        if let Some(guidelines) = &changes.style_guidelines {
            builder.push(", style_guidelines = ").push_bind(guidelines);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" RETURNING ").push(BRAND_KIT_COLUMNS);

        let row = builder
            .build_query_as::<BrandKitRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Brand kit not found".into()))?;

        Ok(row.into())
    }

    async fn delete_brand_kit(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM brand_kits WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Brand kit not found".into()));
        }
        Ok(())
    }
}
