use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{DEFAULT_PER_PAGE, MAX_PER_PAGE},
    entities::generation::GenerationType,
    errors::AppError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Pending,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }
}

impl FromStr for GenerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(GenerationStatus::Pending),
            "completed" => Ok(GenerationStatus::Completed),
            "failed" => Ok(GenerationStatus::Failed),
            other => Err(format!("Unknown generation status: {}", other)),
        }
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct GenerationHistoryRow {
    pub id: i64,
    pub user_id: i64,
    pub original_image_id: Option<i64>,
    pub generated_image_id: Option<i64>,
    pub prompt: String,
    pub style_description: String,
    pub brand_kit_id: Option<i64>,
    pub generation_type: String,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationHistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub original_image_id: Option<i64>,
    pub generated_image_id: Option<i64>,
    pub prompt: String,
    pub style_description: String,
    pub brand_kit_id: Option<i64>,
    pub generation_type: GenerationType,
    pub status: GenerationStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<GenerationHistoryRow> for GenerationHistoryEntry {
    type Error = AppError;

    fn try_from(row: GenerationHistoryRow) -> Result<Self, Self::Error> {
        let generation_type = row
            .generation_type
            .parse::<GenerationType>()
            .map_err(AppError::InternalError)?;
        let status = row
            .status
            .parse::<GenerationStatus>()
            .map_err(AppError::InternalError)?;

        Ok(GenerationHistoryEntry {
            id: row.id,
            user_id: row.user_id,
            original_image_id: row.original_image_id,
            generated_image_id: row.generated_image_id,
            prompt: row.prompt,
            style_description: row.style_description,
            brand_kit_id: row.brand_kit_id,
            generation_type,
            status,
            error_message: row.error_message,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryInsert {
    pub user_id: i64,
    pub original_image_id: Option<i64>,
    pub prompt: String,
    pub style_description: String,
    pub brand_kit_id: Option<i64>,
    pub generation_type: GenerationType,
}

// ───── Pagination & Usage ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    /// `page` below 1 becomes 1; `per_page` below 1 becomes the default and
    /// anything above the maximum is capped.
    pub fn new(page: i64, per_page: i64) -> Self {
        let page = page.max(1);
        let per_page = if per_page <= 0 {
            DEFAULT_PER_PAGE
        } else {
            per_page.min(MAX_PER_PAGE)
        };
        Pagination { page, per_page }
    }

    pub fn from_query(page: Option<&str>, per_page: Option<&str>) -> Self {
        let page = page.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(1);
        let per_page = per_page
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(DEFAULT_PER_PAGE);
        Pagination::new(page, per_page)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        (total + self.per_page - 1) / self.per_page
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub items: Vec<GenerationHistoryEntry>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageStats {
    pub current_month: i64,
    pub total_usage: i64,
    pub max_generations: i64,
    pub remaining: i64,
}

impl UsageStats {
    pub fn new(current_month: i64, total_usage: i64, max_generations: i64) -> Self {
        UsageStats {
            current_month,
            total_usage,
            max_generations,
            remaining: remaining_generations(max_generations, current_month),
        }
    }
}

pub fn remaining_generations(max_generations: i64, current_month: i64) -> i64 {
    max_generations.saturating_sub(current_month).max(0)
}

/// Midnight UTC on the first day of `now`'s month.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
