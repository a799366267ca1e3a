use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;

use crate::{
    constants::{PLACEHOLDER_FILE_NAME, PLACEHOLDER_SIZE, THUMBNAIL_SIZE},
    entities::{
        generation::{ProcessRequest, ProcessedImage},
        media::{GenerationMetadata, MediaAsset, MediaAssetInsert},
    },
    errors::AppError,
    imaging::{
        optimizer::ImageOptimizer,
        thumbnail::{dimensions_from_bytes, placeholder_jpeg, thumbnail_jpeg},
    },
    processing_errors::ProcessingError,
    prompt::build_prompt,
    repositories::{
        image_generation::{GenerationCall, ImageGenerationService},
        media::MediaRepository,
    },
    settings::GenerationSettings,
    storage::local::{
        extension_for_bytes, generated_file_name, mime_for_extension, thumbnail_file_name, MediaStorage,
    },
};

/// Deletes the optimized copy of a source image when dropped, unless the
/// optimizer handed back the source itself.
pub struct TempFileGuard {
    path: Option<PathBuf>,
}

impl TempFileGuard {
    pub fn new(optimized: &Path, source: &Path) -> Self {
        TempFileGuard {
            path: (optimized != source).then(|| optimized.to_path_buf()),
        }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove optimized temp file");
                }
            }
        }
    }
}

/// Writes a square thumbnail next to `file_name`. Failures are logged and
/// reported as `None`.
pub async fn store_thumbnail(storage: &MediaStorage, file_name: &str, bytes: &[u8]) -> Option<String> {
    let source = bytes.to_vec();
    let encoded = tokio::task::spawn_blocking(move || thumbnail_jpeg(&source, THUMBNAIL_SIZE)).await;

    let thumb = match encoded {
        Ok(Ok(thumb)) => thumb,
        Ok(Err(e)) => {
            tracing::warn!(file_name, error = %e, "Thumbnail generation failed");
            return None;
        }
        Err(e) => {
            tracing::warn!(file_name, error = %e, "Thumbnail task panicked");
            return None;
        }
    };

    match storage
        .write_unique(&thumbnail_file_name(file_name, THUMBNAIL_SIZE), &thumb)
        .await
    {
        Ok(name) => Some(name),
        Err(e) => {
            tracing::warn!(file_name, error = %e, "Failed to store thumbnail");
            None
        }
    }
}

pub(crate) fn dimension_to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

pub struct ImageProcessor<M, G>
where
    M: MediaRepository,
    G: ImageGenerationService,
{
    pub media_repo: M,
    pub generator: G,
    pub storage: MediaStorage,
    pub optimizer: ImageOptimizer,
    pub settings: GenerationSettings,
}

impl<M, G> ImageProcessor<M, G>
where
    M: MediaRepository,
    G: ImageGenerationService,
{
    pub fn new(
        media_repo: M,
        generator: G,
        storage: MediaStorage,
        optimizer: ImageOptimizer,
        settings: GenerationSettings,
    ) -> Self {
        ImageProcessor {
            media_repo,
            generator,
            storage,
            optimizer,
            settings,
        }
    }

    /// Source image → optimized copy → generation API → new media asset
    /// parented to the source.
    pub async fn process(&self, request: ProcessRequest) -> Result<ProcessedImage, AppError> {
        let source_name = &request.source.file_name;
        if !self.storage.exists(source_name).await {
            tracing::warn!(asset_id = request.source.id, file_name = %source_name, "Source image file is missing");
            return Err(ProcessingError::SourceNotFound.into());
        }
        let source_path = self.storage.path_for(source_name);

        let optimized = self
            .optimizer
            .optimize(
                &source_path,
                self.settings.max_image_dimension,
                self.settings.max_file_size,
            )
            .await?;
        let _temp_guard = TempFileGuard::new(&optimized, &source_path);

        let prompt = build_prompt(
            &request.prompt,
            &request.style_description,
            request.brand_kit.as_ref(),
            request.generation_type,
        );

        let call = GenerationCall {
            prompt,
            image_path: Some(optimized.clone()),
            model: self.settings.model.clone(),
        };
        let encoded = self.generator.generate(&call).await?;

        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| ProcessingError::InvalidBase64)?;

        let ext = extension_for_bytes(&bytes);
        let desired_name = generated_file_name(source_name, request.generation_type, ext, Utc::now());
        let file_name = self.storage.write_unique(&desired_name, &bytes).await?;

        let (width, height) = dimensions_from_bytes(&bytes).unwrap_or_else(|e| {
            tracing::warn!(file_name = %file_name, error = %e, "Generated image dimensions unreadable");
            (0, 0)
        });
        let thumbnail = store_thumbnail(&self.storage, &file_name, &bytes).await;

        let metadata = GenerationMetadata {
            is_ai_generated: true,
            original_image_id: request.source.id,
            prompt: request.prompt.clone(),
            style_description: request.style_description.clone(),
            generation_type: request.generation_type,
            generation_date: Utc::now(),
            user_id: request.user_id,
            brand_kit_id: request.brand_kit.as_ref().map(|k| k.id),
            brand_kit_name: request.brand_kit.as_ref().map(|k| k.name.clone()),
        };

        let insert = MediaAssetInsert {
            user_id: request.user_id,
            parent_id: Some(request.source.id),
            file_name: file_name.clone(),
            mime_type: mime_for_extension(ext).to_string(),
            file_size: bytes.len() as i64,
            width: dimension_to_i32(width),
            height: dimension_to_i32(height),
            thumbnail_file_name: thumbnail.clone(),
            generation: Some(metadata),
        };

        let asset = match self.media_repo.insert_asset(&insert).await {
            Ok(asset) => asset,
            Err(e) => {
                self.storage.remove(&file_name).await;
                if let Some(thumb) = &thumbnail {
                    self.storage.remove(thumb).await;
                }
                return Err(e);
            }
        };

        tracing::info!(
            source_id = request.source.id,
            asset_id = asset.id,
            generation_type = %request.generation_type,
            "Generated image stored"
        );

        let url = self.storage.url_for(&asset.file_name);
        let thumbnail_url = asset
            .thumbnail_file_name
            .as_deref()
            .map(|t| self.storage.url_for(t))
            .unwrap_or_else(|| url.clone());

        Ok(ProcessedImage {
            asset_id: asset.id,
            url,
            thumbnail_url,
        })
    }

    /// The shared white canvas used as the source for banner generation,
    /// created on first use.
    pub async fn ensure_placeholder(&self, user_id: i64) -> Result<MediaAsset, AppError> {
        if let Some(asset) = self.media_repo.find_by_file_name(PLACEHOLDER_FILE_NAME).await? {
            if !self.storage.exists(&asset.file_name).await {
                let bytes = placeholder_bytes().await?;
                self.storage.overwrite(&asset.file_name, &bytes).await?;
            }
            return Ok(asset);
        }

        // Placeholder bytes are deterministic; concurrent writers produce the same file.
        let bytes = placeholder_bytes().await?;
        self.storage.overwrite(PLACEHOLDER_FILE_NAME, &bytes).await?;

        let insert = MediaAssetInsert {
            user_id,
            parent_id: None,
            file_name: PLACEHOLDER_FILE_NAME.to_string(),
            mime_type: "image/jpeg".to_string(),
            file_size: bytes.len() as i64,
            width: dimension_to_i32(PLACEHOLDER_SIZE),
            height: dimension_to_i32(PLACEHOLDER_SIZE),
            thumbnail_file_name: None,
            generation: None,
        };

        match self.media_repo.insert_asset(&insert).await {
            Ok(asset) => {
                tracing::info!(asset_id = asset.id, "Created banner placeholder image");
                Ok(asset)
            }
            Err(AppError::Conflict(msg)) => {
                tracing::debug!(reason = %msg, "Banner placeholder registered concurrently");
                self.media_repo
                    .find_by_file_name(PLACEHOLDER_FILE_NAME)
                    .await?
                    .ok_or(AppError::Conflict(msg))
            }
            Err(e) => Err(e),
        }
    }
}

async fn placeholder_bytes() -> Result<Vec<u8>, AppError> {
    tokio::task::spawn_blocking(|| placeholder_jpeg(PLACEHOLDER_SIZE))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .map_err(AppError::from)
}
