use chrono::Utc;
use validator::Validate;

use crate::{
    constants::MAX_PROMPT_LENGTH,
    entities::{
        auth::{AuthContext, Capability},
        brand_kit::BrandKit,
        generation::{GenerateRequest, GenerateResponse, GenerationType, ProcessRequest},
        history::{month_start, HistoryInsert, HistoryPage, Pagination, UsageStats},
        media::MediaAsset,
    },
    errors::{AppError, FieldError},
    repositories::{
        brand_kit::BrandKitRepository, history::GenerationHistoryRepository,
        image_generation::ImageGenerationService, media::MediaRepository,
    },
    use_cases::image_processor::ImageProcessor,
};

/// Everything one generation attempt needs once the request is validated.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub source: MediaAsset,
    pub prompt: String,
    pub style_description: String,
    pub brand_kit: Option<BrandKit>,
    pub generation_type: GenerationType,
}

pub struct GenerationHandler<H, B, M, G>
where
    H: GenerationHistoryRepository,
    B: BrandKitRepository,
    M: MediaRepository,
    G: ImageGenerationService,
{
    pub history_repo: H,
    pub brand_kit_repo: B,
    pub processor: ImageProcessor<M, G>,
    pub max_generations: i64,
}

impl<H, B, M, G> GenerationHandler<H, B, M, G>
where
    H: GenerationHistoryRepository,
    B: BrandKitRepository,
    M: MediaRepository,
    G: ImageGenerationService,
{
    pub fn new(history_repo: H, brand_kit_repo: B, processor: ImageProcessor<M, G>, max_generations: i64) -> Self {
        GenerationHandler {
            history_repo,
            brand_kit_repo,
            processor,
            max_generations,
        }
    }

    pub async fn generate(&self, auth: &AuthContext, request: GenerateRequest) -> Result<GenerateResponse, AppError> {
        auth.require(Capability::Generate)?;

        let request = request.normalized();
        request.validate()?;
        let generation_type = request.parsed_type();

        let source = self.load_source_image(request.image_id).await?;
        let brand_kit = self.load_brand_kit(auth, request.brand_kit_id).await?;

        self.run_generation(
            auth,
            GenerationInput {
                source,
                prompt: request.prompt,
                style_description: request.style_description.unwrap_or_default(),
                brand_kit,
                generation_type,
            },
        )
        .await
    }

    /// Quota check, `pending` history row, processor run, then the row is
    /// settled as `completed` or `failed`.
    pub async fn run_generation(&self, auth: &AuthContext, input: GenerationInput) -> Result<GenerateResponse, AppError> {
        check_prompt_length(&input.prompt)?;
        self.ensure_quota(auth.user_id).await?;

        let history_id = self
            .history_repo
            .create_pending(&HistoryInsert {
                user_id: auth.user_id,
                original_image_id: Some(input.source.id),
                prompt: input.prompt.clone(),
                style_description: input.style_description.clone(),
                brand_kit_id: input.brand_kit.as_ref().map(|k| k.id),
                generation_type: input.generation_type,
            })
            .await?;

        let outcome = self
            .processor
            .process(ProcessRequest {
                source: input.source,
                prompt: input.prompt,
                style_description: input.style_description,
                brand_kit: input.brand_kit,
                generation_type: input.generation_type,
                user_id: auth.user_id,
            })
            .await;

        match outcome {
            Ok(processed) => {
                if let Err(e) = self.history_repo.mark_completed(history_id, processed.asset_id).await {
                    tracing::error!(history_id, error = %e, "Failed to mark generation as completed");
                }
                tracing::info!(user_id = auth.user_id, history_id, asset_id = processed.asset_id, "Generation completed");

                Ok(GenerateResponse {
                    success: true,
                    image_id: processed.asset_id,
                    image_url: processed.url,
                    thumbnail_url: processed.thumbnail_url,
                    history_id,
                })
            }
            Err(err) => {
                if let Err(e) = self.history_repo.mark_failed(history_id, &err.to_string()).await {
                    tracing::error!(history_id, error = %e, "Failed to mark generation as failed");
                }
                tracing::warn!(user_id = auth.user_id, history_id, error = %err, "Generation failed");
                Err(err)
            }
        }
    }

    pub(crate) async fn ensure_quota(&self, user_id: i64) -> Result<(), AppError> {
        let used = self.history_repo.count_since(user_id, month_start(Utc::now())).await?;
        if used >= self.max_generations {
            tracing::info!(user_id, used, limit = self.max_generations, "Monthly generation quota reached");
            return Err(AppError::QuotaExceeded {
                used,
                limit: self.max_generations,
            });
        }
        Ok(())
    }

    pub async fn load_source_image(&self, image_id: i64) -> Result<MediaAsset, AppError> {
        let asset = self
            .processor
            .media_repo
            .get_asset(image_id)
            .await?
            .ok_or_else(|| AppError::InvalidImage(format!("Image {} does not exist", image_id)))?;

        if !asset.is_image() {
            return Err(AppError::InvalidImage(format!("Asset {} is not an image", image_id)));
        }
        Ok(asset)
    }

    /// A kit the caller may not see is reported as missing.
    pub async fn load_brand_kit(&self, auth: &AuthContext, brand_kit_id: Option<i64>) -> Result<Option<BrandKit>, AppError> {
        let Some(id) = brand_kit_id else {
            return Ok(None);
        };

        match self.brand_kit_repo.get_brand_kit(id).await? {
            Some(kit) if auth.can_access_owned_by(kit.user_id) => Ok(Some(kit)),
            _ => Err(AppError::NotFound("Brand kit not found".into())),
        }
    }

    pub async fn usage_stats(&self, auth: &AuthContext) -> Result<UsageStats, AppError> {
        if !auth.has(Capability::ViewHistory) {
            auth.require(Capability::Generate)?;
        }

        let current_month = self
            .history_repo
            .count_since(auth.user_id, month_start(Utc::now()))
            .await?;
        let total_usage = self.history_repo.count_for_user(auth.user_id).await?;

        Ok(UsageStats::new(current_month, total_usage, self.max_generations))
    }

    pub async fn list_history(&self, auth: &AuthContext, pagination: Pagination) -> Result<HistoryPage, AppError> {
        auth.require(Capability::ViewHistory)?;

        let total = self.history_repo.count_for_user(auth.user_id).await?;
        let items = self
            .history_repo
            .list_for_user(auth.user_id, pagination.per_page, pagination.offset())
            .await?;

        Ok(HistoryPage {
            items,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
            total_pages: pagination.total_pages(total),
        })
    }
}

/// Composed prompts (catalog templates) are held to the same bound as
/// prompts typed by the user.
pub(crate) fn check_prompt_length(prompt: &str) -> Result<(), AppError> {
    if prompt.chars().count() as u64 > MAX_PROMPT_LENGTH {
        return Err(AppError::ValidationError(vec![FieldError::new(
            "prompt",
            format!("Prompt must be at most {} characters", MAX_PROMPT_LENGTH),
        )]));
    }
    Ok(())
}
