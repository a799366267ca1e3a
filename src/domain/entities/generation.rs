use std::{borrow::Cow, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    constants::{MAX_PROMPT_LENGTH, MAX_STYLE_LENGTH},
    entities::{brand_kit::BrandKit, media::MediaAsset},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationType {
    #[default]
    StyleTransfer,
    BackgroundRemoval,
    ProductVariation,
    CategoryBanner,
}

impl GenerationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationType::StyleTransfer => "style_transfer",
            GenerationType::BackgroundRemoval => "background_removal",
            GenerationType::ProductVariation => "product_variation",
            GenerationType::CategoryBanner => "category_banner",
        }
    }

    /// Marker placed in generated file names.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            GenerationType::StyleTransfer => "ai",
            other => other.as_str(),
        }
    }
}

impl FromStr for GenerationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "style_transfer" => Ok(GenerationType::StyleTransfer),
            "background_removal" => Ok(GenerationType::BackgroundRemoval),
            "product_variation" => Ok(GenerationType::ProductVariation),
            "category_banner" => Ok(GenerationType::CategoryBanner),
            other => Err(format!("Unknown generation type: {}", other)),
        }
    }
}

impl fmt::Display for GenerationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct GenerateRequest {
    #[validate(range(min = 1, message = "A valid image id is required"))]
    pub image_id: i64,

    #[validate(
        length(max = MAX_PROMPT_LENGTH, message = "Prompt must be at most 1000 characters"),
        custom(function = "validate_not_blank")
    )]
    pub prompt: String,

    #[validate(length(max = MAX_STYLE_LENGTH, message = "Style description must be at most 500 characters"))]
    #[serde(default)]
    pub style_description: Option<String>,

    #[serde(default)]
    pub brand_kit_id: Option<i64>,

    #[validate(custom(function = "validate_generation_type"))]
    #[serde(default)]
    pub generation_type: Option<String>,
}

impl GenerateRequest {
    /// Trims free-text fields so length limits apply to the meaningful text.
    pub fn normalized(mut self) -> Self {
        self.prompt = self.prompt.trim().to_string();
        self.style_description = self
            .style_description
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self.generation_type = self
            .generation_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    /// Only meaningful after validation.
    pub fn parsed_type(&self) -> GenerationType {
        self.generation_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    pub success: bool,
    pub image_id: i64,
    pub image_url: String,
    pub thumbnail_url: String,
    pub history_id: i64,
}

/// Everything the image processor needs for one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub source: MediaAsset,
    pub prompt: String,
    pub style_description: String,
    pub brand_kit: Option<BrandKit>,
    pub generation_type: GenerationType,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    pub asset_id: i64,
    pub url: String,
    pub thumbnail_url: String,
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(new_validation_error("blank", "Value cannot be empty"));
    }
    Ok(())
}

pub fn validate_generation_type(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<GenerationType>()
        .map(|_| ())
        .map_err(|_| new_validation_error(
            "invalid_generation_type",
            "Generation type must be one of style_transfer, background_removal, product_variation, category_banner",
        ))
}

pub(crate) fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}
