//! Generation entry points for store catalog integrations. Every image goes
//! through the same quota and history bookkeeping as a direct generation.

use validator::Validate;

use crate::{
    entities::{
        auth::{AuthContext, Capability},
        catalog::{
            background_prompt, banner_prompt, product_base_prompt, variation_prompt, CategoryBannerRequest,
            ProductBackgroundRequest, ProductVariationRequest, VariationBatchResponse, BACKGROUND_STYLE,
            BANNER_STYLE, VARIATION_STYLE,
        },
        generation::{GenerateResponse, GenerationType},
    },
    errors::AppError,
    repositories::{
        brand_kit::BrandKitRepository, history::GenerationHistoryRepository,
        image_generation::ImageGenerationService, media::MediaRepository,
    },
    use_cases::generation::{check_prompt_length, GenerationHandler, GenerationInput},
};

impl<H, B, M, G> GenerationHandler<H, B, M, G>
where
    H: GenerationHistoryRepository,
    B: BrandKitRepository,
    M: MediaRepository,
    G: ImageGenerationService,
{
    /// Stops at the first `QuotaExceeded` or over-long prompt. Fails with the
    /// last error only when no variation succeeded.
    pub async fn generate_product_variations(
        &self,
        auth: &AuthContext,
        request: ProductVariationRequest,
    ) -> Result<VariationBatchResponse, AppError> {
        auth.require(Capability::Generate)?;
        request.validate()?;

        let source = self.load_source_image(request.image_id).await?;
        let brand_kit = self.load_brand_kit(auth, request.brand_kit_id).await?;
        let base = product_base_prompt(&request.product_name, request.product_description.as_deref());

        let mut generated = Vec::new();
        let mut failed = 0usize;
        let mut last_error = None;

        for index in 0..request.variation_count() {
            let input = GenerationInput {
                source: source.clone(),
                prompt: variation_prompt(&base, index),
                style_description: VARIATION_STYLE.to_string(),
                brand_kit: brand_kit.clone(),
                generation_type: GenerationType::ProductVariation,
            };

            match self.run_generation(auth, input).await {
                Ok(response) => generated.push(response),
                Err(e @ (AppError::QuotaExceeded { .. } | AppError::ValidationError(_))) => {
                    failed += 1;
                    last_error = Some(e);
                    break;
                }
                Err(e) => {
                    failed += 1;
                    last_error = Some(e);
                }
            }
        }

        if generated.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        Ok(VariationBatchResponse {
            success: true,
            generated,
            failed,
        })
    }

    pub async fn generate_product_background(
        &self,
        auth: &AuthContext,
        request: ProductBackgroundRequest,
    ) -> Result<GenerateResponse, AppError> {
        auth.require(Capability::Generate)?;
        request.validate()?;

        let source = self.load_source_image(request.image_id).await?;
        let brand_kit = self.load_brand_kit(auth, request.brand_kit_id).await?;
        let base = product_base_prompt(&request.product_name, request.product_description.as_deref());

        self.run_generation(
            auth,
            GenerationInput {
                source,
                prompt: background_prompt(&base, &request.lifestyle_prompt),
                style_description: BACKGROUND_STYLE.to_string(),
                brand_kit,
                generation_type: GenerationType::BackgroundRemoval,
            },
        )
        .await
    }

    pub async fn generate_category_banner(
        &self,
        auth: &AuthContext,
        request: CategoryBannerRequest,
    ) -> Result<GenerateResponse, AppError> {
        auth.require(Capability::Generate)?;
        request.validate()?;

        let brand_kit = self.load_brand_kit(auth, request.brand_kit_id).await?;
        let prompt = banner_prompt(&request.category_name, request.category_description.as_deref());

        // The placeholder asset is only created for callers who can generate.
        check_prompt_length(&prompt)?;
        self.ensure_quota(auth.user_id).await?;
        let source = self.processor.ensure_placeholder(auth.user_id).await?;

        self.run_generation(
            auth,
            GenerationInput {
                source,
                prompt,
                style_description: BANNER_STYLE.to_string(),
                brand_kit,
                generation_type: GenerationType::CategoryBanner,
            },
        )
        .await
    }
}
