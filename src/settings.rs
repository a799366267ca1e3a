use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::{collections::HashSet, env, fmt, path::PathBuf, str::FromStr};
use zeroize::Zeroizing;

use crate::constants::{
    DEFAULT_DECODE_MEMORY_BUDGET, DEFAULT_MAX_FILES_PER_UPLOAD, DEFAULT_MAX_FILE_SIZE,
    DEFAULT_MAX_GENERATIONS, DEFAULT_MAX_IMAGE_DIMENSION, DEFAULT_MODEL,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TOGETHER_API_URL, DEFAULT_TOGETHER_MODELS_URL,
    SUPPORTED_FILE_TYPES,
};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_minutes: i64,

    /// Base used when building public asset URLs, e.g. `https://cdn.example.com`.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,

    #[serde(default = "default_temp_sweep_interval")]
    pub temp_sweep_interval_secs: u64,

    #[serde(default)]
    pub generation: GenerationSettings,
}

/// Settings read by the generation pipeline. Defaults are applied once in
/// [`GenerationSettings::normalize`], never at the read site.
#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct GenerationSettings {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_models_url")]
    pub models_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_generations")]
    pub max_generations_per_user: i64,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_max_files_per_upload")]
    pub max_files_per_upload: usize,

    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,

    #[serde(default = "default_allowed_file_types")]
    pub allowed_file_types: Vec<String>,

    #[serde(default)]
    pub temp_directory: PathBuf,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_decode_memory_budget")]
    pub decode_memory_budget: u64,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "AI-Images-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_jwt_expiration() -> i64 {
    15
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}
fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}
fn default_temp_sweep_interval() -> u64 {
    60 * 60
}
fn default_api_url() -> String {
    DEFAULT_TOGETHER_API_URL.to_string()
}
fn default_models_url() -> String {
    DEFAULT_TOGETHER_MODELS_URL.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_max_generations() -> i64 {
    DEFAULT_MAX_GENERATIONS
}
fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}
fn default_max_files_per_upload() -> usize {
    DEFAULT_MAX_FILES_PER_UPLOAD
}
fn default_max_image_dimension() -> u32 {
    DEFAULT_MAX_IMAGE_DIMENSION
}
fn default_allowed_file_types() -> Vec<String> {
    SUPPORTED_FILE_TYPES.iter().map(|t| t.to_string()).collect()
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_decode_memory_budget() -> u64 {
    DEFAULT_DECODE_MEMORY_BUDGET
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            api_key: String::new(),
            api_url: default_api_url(),
            models_url: default_models_url(),
            model: default_model(),
            max_generations_per_user: default_max_generations(),
            max_file_size: default_max_file_size(),
            max_files_per_upload: default_max_files_per_upload(),
            max_image_dimension: default_max_image_dimension(),
            allowed_file_types: default_allowed_file_types(),
            temp_directory: PathBuf::new(),
            request_timeout_secs: default_request_timeout(),
            decode_memory_budget: default_decode_memory_budget(),
        }
    }
}

impl GenerationSettings {
    /// Replaces out-of-range values with their defaults and resolves the temp
    /// directory against the uploads directory when it was left unset.
    pub fn normalize(mut self, uploads_dir: &std::path::Path) -> Self {
        if self.max_generations_per_user <= 0 {
            self.max_generations_per_user = DEFAULT_MAX_GENERATIONS;
        }
        if self.max_image_dimension == 0 {
            self.max_image_dimension = DEFAULT_MAX_IMAGE_DIMENSION;
        }
        if self.max_file_size == 0 {
            self.max_file_size = DEFAULT_MAX_FILE_SIZE;
        }
        if self.max_files_per_upload == 0 {
            self.max_files_per_upload = DEFAULT_MAX_FILES_PER_UPLOAD;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        if self.decode_memory_budget == 0 {
            self.decode_memory_budget = DEFAULT_DECODE_MEMORY_BUDGET;
        }
        if self.model.trim().is_empty() {
            self.model = DEFAULT_MODEL.to_string();
        }

        let mut seen = HashSet::new();
        let types: Vec<String> = self
            .allowed_file_types
            .iter()
            .flat_map(|t| t.split(','))
            .map(|t| t.trim().trim_start_matches('.').to_lowercase())
            .filter(|t| SUPPORTED_FILE_TYPES.contains(&t.as_str()))
            .filter(|t| seen.insert(t.clone()))
            .collect();
        self.allowed_file_types = if types.is_empty() {
            default_allowed_file_types()
        } else {
            types
        };

        if self.temp_directory.as_os_str().is_empty() {
            self.temp_directory = uploads_dir.join("ai-temp");
        }
        self
    }

    pub fn is_api_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn allows_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.allowed_file_types.iter().any(|t| *t == ext)
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .with_list_parse_key("generation.allowed_file_types")
                    .try_parsing(true)
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        config.database_url = fill_or_env(config.database_url, "APP_DATABASE_URL")?;
        config.jwt_secret = fill_or_env(config.jwt_secret, "APP_JWT_SECRET")?;

        if config.generation.api_key.trim().is_empty() {
            if let Ok(key) = env::var("TOGETHER_API_KEY") {
                config.generation.api_key = key;
            }
        }

        config.generation = config.generation.normalize(&config.uploads_dir);

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty");
        }
        if self.jwt_secret.len() < 32 {
            errors.push("JWT_SECRET must be at least 32 characters");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }
        if url::Url::parse(&self.public_base_url).is_err() {
            errors.push("PUBLIC_BASE_URL must be an absolute URL");
        }
        if url::Url::parse(&self.generation.api_url).is_err() {
            errors.push("GENERATION__API_URL must be an absolute URL");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else if self.len() < 32 {
            "[TOO_SHORT]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret", &self.jwt_secret.redact())
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("public_base_url", &self.public_base_url)
            .field("uploads_dir", &self.uploads_dir)
            .field("temp_sweep_interval_secs", &self.temp_sweep_interval_secs)
            .field("generation", &self.generation)
            .finish()
    }
}

impl fmt::Debug for GenerationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationSettings")
            .field("api_key", &self.api_key.redact())
            .field("api_url", &self.api_url)
            .field("models_url", &self.models_url)
            .field("model", &self.model)
            .field("max_generations_per_user", &self.max_generations_per_user)
            .field("max_file_size", &self.max_file_size)
            .field("max_files_per_upload", &self.max_files_per_upload)
            .field("max_image_dimension", &self.max_image_dimension)
            .field("allowed_file_types", &self.allowed_file_types)
            .field("temp_directory", &self.temp_directory)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("decode_memory_budget", &self.decode_memory_budget)
            .finish()
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl From<&AppConfig> for JwtKeys {
    fn from(config: &AppConfig) -> Self {
        let jwt_secret = Zeroizing::new(config.jwt_secret.clone());

        JwtKeys {
            encoding: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn normalize_replaces_non_positive_quota_with_default() {
        let settings = GenerationSettings {
            max_generations_per_user: 0,
            ..Default::default()
        }
        .normalize(Path::new("uploads"));
        assert_eq!(settings.max_generations_per_user, DEFAULT_MAX_GENERATIONS);

        let settings = GenerationSettings {
            max_generations_per_user: -3,
            ..Default::default()
        }
        .normalize(Path::new("uploads"));
        assert_eq!(settings.max_generations_per_user, DEFAULT_MAX_GENERATIONS);
    }

    #[test]
    fn normalize_keeps_positive_quota() {
        let settings = GenerationSettings {
            max_generations_per_user: 7,
            ..Default::default()
        }
        .normalize(Path::new("uploads"));
        assert_eq!(settings.max_generations_per_user, 7);
    }

    #[test]
    fn normalize_filters_unknown_file_types() {
        let settings = GenerationSettings {
            allowed_file_types: vec!["PNG".into(), ".jpg".into(), "exe".into()],
            ..Default::default()
        }
        .normalize(Path::new("uploads"));
        assert_eq!(settings.allowed_file_types, vec!["png", "jpg"]);
        assert!(settings.allows_extension("JPG"));
        assert!(!settings.allows_extension("gif"));
    }

    #[test]
    fn normalize_drops_repeated_file_types() {
        let settings = GenerationSettings {
            allowed_file_types: vec!["png,jpg,png".into(), ".JPG".into()],
            ..Default::default()
        }
        .normalize(Path::new("uploads"));
        assert_eq!(settings.allowed_file_types, vec!["png", "jpg"]);
    }

    #[test]
    fn normalize_falls_back_to_all_types_when_none_survive() {
        let settings = GenerationSettings {
            allowed_file_types: vec!["bmp".into()],
            ..Default::default()
        }
        .normalize(Path::new("uploads"));
        assert_eq!(settings.allowed_file_types.len(), SUPPORTED_FILE_TYPES.len());
    }

    #[test]
    fn normalize_resolves_temp_directory_under_uploads() {
        let settings = GenerationSettings::default().normalize(Path::new("/srv/uploads"));
        assert_eq!(settings.temp_directory, PathBuf::from("/srv/uploads/ai-temp"));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let settings = GenerationSettings {
            api_key: "tg-0123456789abcdef0123456789abcdef".into(),
            ..Default::default()
        };
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("0123456789abcdef"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
