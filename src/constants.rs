use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

pub const DEFAULT_TOGETHER_API_URL: &str = "https://api.together.xyz/v1/images/generations";
pub const DEFAULT_TOGETHER_MODELS_URL: &str = "https://api.together.xyz/v1/models";
pub const DEFAULT_MODEL: &str = "black-forest-labs/FLUX.1-schnell";

pub const DEFAULT_MAX_GENERATIONS: i64 = 50;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
pub const DEFAULT_MAX_FILES_PER_UPLOAD: usize = 5;
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 1024;
pub const DEFAULT_DECODE_MEMORY_BUDGET: u64 = 512 * 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const SUPPORTED_FILE_TYPES: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

pub const MAX_PROMPT_LENGTH: u64 = 1000;
pub const MAX_STYLE_LENGTH: u64 = 500;
pub const MAX_BRAND_KIT_NAME_LENGTH: u64 = 255;
pub const MAX_STYLE_GUIDELINES_LENGTH: u64 = 1000;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

pub const THUMBNAIL_SIZE: u32 = 150;
pub const PLACEHOLDER_FILE_NAME: &str = "ai-placeholder.jpg";
pub const PLACEHOLDER_SIZE: u32 = 1024;
