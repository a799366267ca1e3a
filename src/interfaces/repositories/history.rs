use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    entities::history::{GenerationHistoryEntry, GenerationHistoryRow, GenerationStatus, HistoryInsert},
    errors::AppError,
    repositories::sqlx_repo::SqlxHistoryRepo,
};

#[async_trait]
pub trait GenerationHistoryRepository: Send + Sync {
    /// Inserts a `pending` row and returns its id.
    async fn create_pending(&self, entry: &HistoryInsert) -> Result<i64, AppError>;
    /// Only rows still `pending` can be completed; anything else is a `Conflict`.
    async fn mark_completed(&self, id: i64, generated_image_id: i64) -> Result<(), AppError>;
    async fn mark_failed(&self, id: i64, error_message: &str) -> Result<(), AppError>;
    async fn count_since(&self, user_id: i64, since: DateTime<Utc>) -> Result<i64, AppError>;
    async fn count_for_user(&self, user_id: i64) -> Result<i64, AppError>;
    async fn list_for_user(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<GenerationHistoryEntry>, AppError>;
}

impl SqlxHistoryRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxHistoryRepo { pool }
    }
}

fn ensure_transitioned(rows_affected: u64, id: i64) -> Result<(), AppError> {
    if rows_affected == 0 {
        return Err(AppError::Conflict(format!(
            "History entry {} is not pending",
            id
        )));
    }
    Ok(())
}

#[async_trait]
impl GenerationHistoryRepository for SqlxHistoryRepo {
    async fn create_pending(&self, entry: &HistoryInsert) -> Result<i64, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO generation_history (
                user_id, original_image_id, prompt, style_description,
                brand_kit_id, generation_type, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.original_image_id)
        .bind(&entry.prompt)
        .bind(&entry.style_description)
        .bind(entry.brand_kit_id)
        .bind(entry.generation_type.as_str())
        .bind(GenerationStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn mark_completed(&self, id: i64, generated_image_id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE generation_history
            SET status = $1, generated_image_id = $2, error_message = NULL
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(GenerationStatus::Completed.as_str())
        .bind(generated_image_id)
        .bind(id)
        .bind(GenerationStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        ensure_transitioned(result.rows_affected(), id)
    }

    async fn mark_failed(&self, id: i64, error_message: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE generation_history
            SET status = $1, error_message = $2, generated_image_id = NULL
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(GenerationStatus::Failed.as_str())
        .bind(error_message)
        .bind(id)
        .bind(GenerationStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        ensure_transitioned(result.rows_affected(), id)
    }

    async fn count_since(&self, user_id: i64, since: DateTime<Utc>) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM generation_history WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_for_user(&self, user_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM generation_history WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list_for_user(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<GenerationHistoryEntry>, AppError> {
        let rows = sqlx::query_as::<_, GenerationHistoryRow>(
            r#"
            SELECT id, user_id, original_image_id, generated_image_id, prompt,
                   style_description, brand_kit_id, generation_type, status,
                   error_message, created_at
            FROM generation_history
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(GenerationHistoryEntry::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rows_means_the_entry_already_left_pending() {
        assert!(ensure_transitioned(1, 7).is_ok());
        assert!(matches!(ensure_transitioned(0, 7), Err(AppError::Conflict(_))));
    }
}
