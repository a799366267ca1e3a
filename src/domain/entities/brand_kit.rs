use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use validator::{Validate, ValidationError};

use crate::{
    constants::{MAX_BRAND_KIT_NAME_LENGTH, MAX_STYLE_GUIDELINES_LENGTH},
    entities::generation::{new_validation_error, validate_not_blank},
    utils::sanitize::strip_tags,
};

// ───── Constants ──────────────────────────────────────────────────────
const MAX_COLORS: usize = 20;
const MAX_FONTS: usize = 20;
const MAX_FONT_LENGTH: usize = 100;
const COPY_SUFFIX: &str = " (Copy)";

pub const DEFAULT_BRAND_COLORS: [&str; 8] = [
    "#1F2937", "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#F97316", "#06B6D4",
];

pub const DEFAULT_FONTS: [&str; 8] = [
    "Arial", "Helvetica", "Times New Roman", "Georgia", "Verdana", "Tahoma", "Trebuchet MS", "Impact",
];

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("hex color pattern is valid")
});

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct BrandKitRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub colors: Json<Vec<String>>,
    pub fonts: Json<Vec<String>>,
    pub style_guidelines: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrandKit {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub colors: Vec<String>,
    pub fonts: Vec<String>,
    pub style_guidelines: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BrandKitRow> for BrandKit {
    fn from(row: BrandKitRow) -> Self {
        BrandKit {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            colors: row.colors.0,
            fonts: row.fonts.0,
            style_guidelines: row.style_guidelines,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrandKitInsert {
    pub user_id: i64,
    pub name: String,
    pub colors: Vec<String>,
    pub fonts: Vec<String>,
    pub style_guidelines: String,
}

#[derive(Debug, Clone, Default)]
pub struct BrandKitChanges {
    pub name: Option<String>,
    pub colors: Option<Vec<String>>,
    pub fonts: Option<Vec<String>>,
    pub style_guidelines: Option<String>,
}

impl BrandKitChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.colors.is_none()
            && self.fonts.is_none()
            && self.style_guidelines.is_none()
    }
}

// ───── Input & Validation Requests ──────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewBrandKitRequest {
    #[validate(
        length(min = 1, max = MAX_BRAND_KIT_NAME_LENGTH, message = "Name must be between 1 and 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,

    #[validate(custom(function = "validate_colors"))]
    #[serde(default)]
    pub colors: Vec<String>,

    #[validate(custom(function = "validate_fonts"))]
    #[serde(default)]
    pub fonts: Vec<String>,

    #[validate(length(max = MAX_STYLE_GUIDELINES_LENGTH, message = "Style guidelines must be at most 1000 characters"))]
    #[serde(default)]
    pub style_guidelines: Option<String>,
}

impl NewBrandKitRequest {
    /// Strips markup and trims colors. Validate the result, not the raw input.
    pub fn sanitized(self) -> Self {
        NewBrandKitRequest {
            name: strip_tags(&self.name),
            colors: self.colors.iter().map(|c| c.trim().to_string()).collect(),
            fonts: self.fonts.iter().map(|f| strip_tags(f)).collect(),
            style_guidelines: self.style_guidelines.as_deref().map(strip_tags),
        }
    }

    pub fn into_insert(self, user_id: i64) -> BrandKitInsert {
        BrandKitInsert {
            user_id,
            name: self.name,
            colors: self.colors,
            fonts: self.fonts,
            style_guidelines: self.style_guidelines.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateBrandKitRequest {
    #[validate(
        length(min = 1, max = MAX_BRAND_KIT_NAME_LENGTH, message = "Name must be between 1 and 255 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,

    #[validate(custom(function = "validate_colors"))]
    pub colors: Option<Vec<String>>,

    #[validate(custom(function = "validate_fonts"))]
    pub fonts: Option<Vec<String>>,

    #[validate(length(max = MAX_STYLE_GUIDELINES_LENGTH, message = "Style guidelines must be at most 1000 characters"))]
    pub style_guidelines: Option<String>,
}

impl UpdateBrandKitRequest {
    pub fn sanitized(self) -> Self {
        UpdateBrandKitRequest {
            name: self.name.as_deref().map(strip_tags),
            colors: self.colors.map(|cs| cs.iter().map(|c| c.trim().to_string()).collect()),
            fonts: self.fonts.map(|fs| fs.iter().map(|f| strip_tags(f)).collect()),
            style_guidelines: self.style_guidelines.as_deref().map(strip_tags),
        }
    }
}

impl From<UpdateBrandKitRequest> for BrandKitChanges {
    fn from(req: UpdateBrandKitRequest) -> Self {
        BrandKitChanges {
            name: req.name,
            colors: req.colors,
            fonts: req.fonts,
            style_guidelines: req.style_guidelines,
        }
    }
}

// ───── Export / Import ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrandKitExport {
    pub name: String,
    pub colors: Vec<String>,
    pub fonts: Vec<String>,
    pub style_guidelines: String,
    pub exported_at: DateTime<Utc>,
    pub exported_by: String,
}

impl BrandKitExport {
    pub fn from_kit(kit: &BrandKit, exported_by: &str) -> Self {
        BrandKitExport {
            name: kit.name.clone(),
            colors: kit.colors.clone(),
            fonts: kit.fonts.clone(),
            style_guidelines: kit.style_guidelines.clone(),
            exported_at: Utc::now(),
            exported_by: exported_by.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BrandKitExportResponse {
    pub success: bool,
    pub export_data: BrandKitExport,
}

/// Exported documents may come from older versions, so everything but the
/// name is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportedBrandKit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub fonts: Vec<String>,
    #[serde(default)]
    pub style_guidelines: Option<String>,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exported_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBrandKitRequest {
    pub brand_kit_data: ImportedBrandKit,
}

impl From<BrandKitExport> for ImportedBrandKit {
    fn from(export: BrandKitExport) -> Self {
        ImportedBrandKit {
            name: Some(export.name),
            colors: export.colors,
            fonts: export.fonts,
            style_guidelines: Some(export.style_guidelines),
            exported_at: Some(export.exported_at),
            exported_by: Some(export.exported_by),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BrandKitDefaults {
    pub colors: Vec<&'static str>,
    pub fonts: Vec<&'static str>,
}

impl Default for BrandKitDefaults {
    fn default() -> Self {
        BrandKitDefaults {
            colors: DEFAULT_BRAND_COLORS.to_vec(),
            fonts: DEFAULT_FONTS.to_vec(),
        }
    }
}

/// Name for a duplicated kit, shortened so it stays within the name limit.
pub fn copy_name(name: &str) -> String {
    let budget = MAX_BRAND_KIT_NAME_LENGTH as usize - COPY_SUFFIX.chars().count();
    let base: String = name.chars().take(budget).collect();
    format!("{}{}", base, COPY_SUFFIX)
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value.trim())
}

pub fn validate_colors(colors: &[String]) -> Result<(), ValidationError> {
    if colors.len() > MAX_COLORS {
        return Err(new_validation_error("too_many_colors", "At most 20 colors are allowed"));
    }
    if colors.iter().any(|c| !is_hex_color(c)) {
        return Err(new_validation_error("invalid_color", "Colors must be hex values like #3B82F6"));
    }
    Ok(())
}

pub fn validate_fonts(fonts: &[String]) -> Result<(), ValidationError> {
    if fonts.len() > MAX_FONTS {
        return Err(new_validation_error("too_many_fonts", "At most 20 fonts are allowed"));
    }
    if fonts.iter().any(|f| f.trim().is_empty() || f.chars().count() > MAX_FONT_LENGTH) {
        return Err(new_validation_error("invalid_font", "Font names must be between 1 and 100 characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(colors: &[&str]) -> NewBrandKitRequest {
        NewBrandKitRequest {
            name: "Acme".into(),
            colors: colors.iter().map(|c| c.to_string()).collect(),
            fonts: vec!["Inter".into()],
            style_guidelines: None,
        }
    }

    #[test]
    fn color_validation_accepts_hex_and_rejects_names() {
        assert!(request(&["#3B82F6", "#ffffff"]).validate().is_ok());
        assert!(request(&["blue"]).validate().is_err());
        assert!(request(&["#ZZZZZZ"]).validate().is_err());
        assert!(request(&["#FFF"]).validate().is_err());
    }

    #[test]
    fn update_with_bad_color_is_rejected() {
        let update = UpdateBrandKitRequest {
            colors: Some(vec!["red".into()]),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn copy_name_appends_suffix() {
        assert_eq!(copy_name("Summer"), "Summer (Copy)");
    }

    #[test]
    fn copy_name_stays_within_limit() {
        let long = "n".repeat(255);
        let copied = copy_name(&long);
        assert_eq!(copied.chars().count(), 255);
        assert!(copied.ends_with(" (Copy)"));
    }

    #[test]
    fn insert_strips_markup_from_text() {
        let req = NewBrandKitRequest {
            name: "<b>Acme</b>".into(),
            colors: vec![],
            fonts: vec![],
            style_guidelines: Some("<script>x</script>Bold & clean".into()),
        };
        let insert = req.sanitized().into_insert(1);
        assert_eq!(insert.name, "Acme");
        assert_eq!(insert.style_guidelines, "Bold & clean");
    }

    #[test]
    fn markup_only_name_is_blank_once_sanitized() {
        let req = NewBrandKitRequest {
            name: "<b></b>".into(),
            ..request(&[])
        };
        assert!(req.clone().validate().is_ok());
        assert!(req.sanitized().validate().is_err());

        let update = UpdateBrandKitRequest {
            name: Some("<i> </i>".into()),
            ..Default::default()
        };
        assert!(update.sanitized().validate().is_err());
    }
}
