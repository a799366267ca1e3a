use std::path::Path;

use futures::future::join_all;

use crate::{
    entities::{
        auth::{AuthContext, Capability},
        media::{MediaAsset, MediaAssetInsert, MediaAssetResponse, UploadOutcome, UploadResponse, UploadedFile},
    },
    errors::AppError,
    imaging::thumbnail::dimensions_from_bytes,
    repositories::media::MediaRepository,
    settings::GenerationSettings,
    storage::local::MediaStorage,
    use_cases::image_processor::{dimension_to_i32, store_thumbnail},
    utils::sanitize::file_stem_slug,
};

pub fn asset_response(asset: &MediaAsset, storage: &MediaStorage) -> MediaAssetResponse {
    let url = storage.url_for(&asset.file_name);
    let thumbnail_url = asset
        .thumbnail_file_name
        .as_deref()
        .map(|t| storage.url_for(t))
        .unwrap_or_else(|| url.clone());

    MediaAssetResponse {
        id: asset.id,
        file_name: asset.file_name.clone(),
        url,
        thumbnail_url,
        mime_type: asset.mime_type.clone(),
        file_size: asset.file_size,
        width: asset.width,
        height: asset.height,
        parent_id: asset.parent_id,
        generation: asset.generation.clone(),
        created_at: asset.created_at,
    }
}

pub struct MediaHandler<M>
where
    M: MediaRepository,
{
    pub media_repo: M,
    pub storage: MediaStorage,
    pub settings: GenerationSettings,
}

impl<M> MediaHandler<M>
where
    M: MediaRepository,
{
    pub fn new(media_repo: M, storage: MediaStorage, settings: GenerationSettings) -> Self {
        MediaHandler {
            media_repo,
            storage,
            settings,
        }
    }

    /// Each file is validated and stored independently; one bad file does
    /// not fail the batch.
    pub async fn upload(&self, auth: &AuthContext, files: &[UploadedFile]) -> Result<UploadResponse, AppError> {
        auth.require(Capability::Generate)?;

        if files.is_empty() {
            return Err(AppError::BadRequest("No files were uploaded".into()));
        }
        if files.len() > self.settings.max_files_per_upload {
            return Err(AppError::BadRequest(format!(
                "At most {} files can be uploaded at once",
                self.settings.max_files_per_upload
            )));
        }

        let stored = join_all(files.iter().map(|file| self.store_upload(auth.user_id, file))).await;

        let results: Vec<UploadOutcome> = files
            .iter()
            .zip(stored)
            .map(|(file, result)| match result {
                Ok(asset) => UploadOutcome {
                    file_name: file.original_name.clone(),
                    success: true,
                    asset: Some(asset_response(&asset, &self.storage)),
                    error: None,
                },
                Err(e) => {
                    tracing::info!(file_name = %file.original_name, error = %e, "Upload rejected");
                    UploadOutcome {
                        file_name: file.original_name.clone(),
                        success: false,
                        asset: None,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        let uploaded = results.iter().filter(|r| r.success).count();
        Ok(UploadResponse {
            uploaded,
            failed: results.len() - uploaded,
            results,
        })
    }

    async fn store_upload(&self, user_id: i64, file: &UploadedFile) -> Result<MediaAsset, AppError> {
        let ext = Path::new(&file.original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| AppError::BadRequest("File has no extension".into()))?;

        if !self.settings.allows_extension(&ext) {
            return Err(AppError::BadRequest(format!("File type .{} is not allowed", ext)));
        }

        if file.size > self.settings.max_file_size {
            return Err(AppError::BadRequest(format!(
                "File exceeds the maximum size of {} bytes",
                self.settings.max_file_size
            )));
        }

        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to read upload: {}", e)))?;

        let mime_type = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .filter(|mime| mime.starts_with("image/"))
            .ok_or_else(|| AppError::InvalidImage("File content is not an image".into()))?;

        let (width, height) = dimensions_from_bytes(&bytes).map_err(|e| AppError::InvalidImage(e.to_string()))?;

        let desired_name = format!("{}.{}", file_stem_slug(&file.original_name), ext);
        let file_name = self.storage.write_unique(&desired_name, &bytes).await?;
        let thumbnail = store_thumbnail(&self.storage, &file_name, &bytes).await;

        let insert = MediaAssetInsert {
            user_id,
            parent_id: None,
            file_name: file_name.clone(),
            mime_type: mime_type.to_string(),
            file_size: bytes.len() as i64,
            width: dimension_to_i32(width),
            height: dimension_to_i32(height),
            thumbnail_file_name: thumbnail.clone(),
            generation: None,
        };

        match self.media_repo.insert_asset(&insert).await {
            Ok(asset) => Ok(asset),
            Err(e) => {
                self.storage.remove(&file_name).await;
                if let Some(thumb) = &thumbnail {
                    self.storage.remove(thumb).await;
                }
                Err(e)
            }
        }
    }

    pub async fn get_asset(&self, auth: &AuthContext, id: i64) -> Result<MediaAssetResponse, AppError> {
        auth.require(Capability::Generate)?;

        let asset = self
            .media_repo
            .get_asset(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media asset {} not found", id)))?;

        Ok(asset_response(&asset, &self.storage))
    }
}
