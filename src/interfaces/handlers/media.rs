use actix_multipart::form::MultipartForm;
use actix_web::{get, web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{
        auth::AuthContext,
        media::{MediaUploadForm, UploadedFile},
    },
    errors::AppError,
    utils::sanitize::is_safe_file_name,
    AppState,
};

#[instrument(skip(auth, state, form), fields(user_id = auth.user_id))]
pub async fn upload_media(
    auth: AuthContext,
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<MediaUploadForm>,
) -> Result<impl Responder, AppError> {
    // The temp files live as long as `form`, so paths stay valid for the whole upload.
    let files: Vec<UploadedFile> = form
        .files
        .iter()
        .map(|f| UploadedFile {
            original_name: f.file_name.clone().unwrap_or_default(),
            path: f.file.path().to_path_buf(),
            size: f.size as u64,
        })
        .collect();

    let response = state.media_handler.upload(&auth, &files).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(auth, state, asset_id), fields(user_id = auth.user_id))]
pub async fn get_media(
    auth: AuthContext,
    state: web::Data<AppState>,
    asset_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let asset = state
        .media_handler
        .get_asset(&auth, asset_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(asset))
}

#[get("/uploads/{file_name}")]
pub async fn serve_upload(
    state: web::Data<AppState>,
    file_name: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let file_name = file_name.into_inner();
    if !is_safe_file_name(&file_name) {
        return Err(AppError::BadRequest("Invalid file name".into()));
    }

    let bytes = state
        .media_handler
        .storage
        .read(&file_name)
        .await
        .map_err(|_| AppError::NotFound(format!("File {} not found", file_name)))?;

    let content_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    Ok(HttpResponse::Ok().content_type(content_type).body(bytes))
}
