use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::generation::{validate_not_blank, GenerateResponse};

const DEFAULT_VARIATION_COUNT: u32 = 3;
const MAX_VARIATION_COUNT: u32 = 10;

pub const VARIATION_STYLE: &str = "product photography";
pub const BACKGROUND_STYLE: &str = "lifestyle photography";
pub const BANNER_STYLE: &str = "banner design";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductVariationRequest {
    #[validate(range(min = 1, message = "A valid product image id is required"))]
    pub image_id: i64,

    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub product_name: String,

    #[validate(length(max = 800))]
    #[serde(default)]
    pub product_description: Option<String>,

    #[serde(default)]
    pub count: Option<u32>,

    #[serde(default)]
    pub brand_kit_id: Option<i64>,
}

impl ProductVariationRequest {
    pub fn variation_count(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_VARIATION_COUNT)
            .clamp(1, MAX_VARIATION_COUNT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductBackgroundRequest {
    #[validate(range(min = 1, message = "A valid product image id is required"))]
    pub image_id: i64,

    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub product_name: String,

    #[validate(length(max = 800))]
    #[serde(default)]
    pub product_description: Option<String>,

    #[validate(length(min = 1, max = 500), custom(function = "validate_not_blank"))]
    pub lifestyle_prompt: String,

    #[serde(default)]
    pub brand_kit_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryBannerRequest {
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub category_name: String,

    #[validate(length(max = 800))]
    #[serde(default)]
    pub category_description: Option<String>,

    #[serde(default)]
    pub brand_kit_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct VariationBatchResponse {
    pub success: bool,
    pub generated: Vec<GenerateResponse>,
    pub failed: usize,
}

/// The product description when present, otherwise its name.
pub fn product_base_prompt(name: &str, description: Option<&str>) -> String {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => description.to_string(),
        None => name.trim().to_string(),
    }
}

/// `index` is zero-based; prompts number variations from 1.
pub fn variation_prompt(base: &str, index: u32) -> String {
    format!("{}, variation {}, different angle or style", base, index + 1)
}

pub fn background_prompt(base: &str, lifestyle: &str) -> String {
    format!("{} in {}", base, lifestyle.trim())
}

pub fn banner_prompt(category_name: &str, description: Option<&str>) -> String {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => format!("Banner for {} category, {}", category_name.trim(), description),
        None => format!("Banner for {} category", category_name.trim()),
    }
}
