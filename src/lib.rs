mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod processing_errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, prompt, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{auth, db, generation, imaging, storage, utils};

use auth::jwt::JwtService;
use generation::client::GenerationClient;
use imaging::optimizer::ImageOptimizer;
use repositories::sqlx_repo::{SqlxBrandKitRepo, SqlxHistoryRepo, SqlxMediaRepo};
use storage::local::MediaStorage;
use use_cases::{
    brand_kit::BrandKitHandler, generation::GenerationHandler, image_processor::ImageProcessor,
    media::MediaHandler,
};

pub struct AppState {
    pub jwt_service: JwtService,
    pub generation_client: GenerationClient,
    pub generation_handler: AppGenerationHandler,
    pub brand_kit_handler: AppBrandKitHandler,
    pub media_handler: AppMediaHandler,
}

pub type AppImageProcessor = ImageProcessor<SqlxMediaRepo, GenerationClient>;
pub type AppGenerationHandler = GenerationHandler<SqlxHistoryRepo, SqlxBrandKitRepo, SqlxMediaRepo, GenerationClient>;
pub type AppBrandKitHandler = BrandKitHandler<SqlxBrandKitRepo>;
pub type AppMediaHandler = MediaHandler<SqlxMediaRepo>;

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> Self {
        let generation_settings = config.generation.clone();
        let storage = MediaStorage::new(&config.uploads_dir, &config.public_base_url);
        let generation_client = GenerationClient::new(&generation_settings);

        if !generation_client.is_configured() {
            tracing::warn!("Generation API key is not configured; generation requests will fail");
        }

        let processor = ImageProcessor::new(
            SqlxMediaRepo::new(pool.clone()),
            generation_client.clone(),
            storage.clone(),
            ImageOptimizer::new(
                &generation_settings.temp_directory,
                generation_settings.decode_memory_budget,
            ),
            generation_settings.clone(),
        );

        AppState {
            jwt_service: JwtService::new(config),
            generation_client,
            generation_handler: GenerationHandler::new(
                SqlxHistoryRepo::new(pool.clone()),
                SqlxBrandKitRepo::new(pool.clone()),
                processor,
                generation_settings.max_generations_per_user,
            ),
            brand_kit_handler: BrandKitHandler::new(SqlxBrandKitRepo::new(pool.clone())),
            media_handler: MediaHandler::new(SqlxMediaRepo::new(pool), storage, generation_settings),
        }
    }
}
