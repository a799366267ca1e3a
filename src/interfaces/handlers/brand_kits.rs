use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{
        auth::AuthContext,
        brand_kit::{ImportBrandKitRequest, NewBrandKitRequest, UpdateBrandKitRequest},
    },
    errors::AppError,
    AppState,
};

#[instrument(skip(auth, state), fields(user_id = auth.user_id))]
pub async fn list_brand_kits(
    auth: AuthContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let kits = state.brand_kit_handler.list_brand_kits(&auth).await?;
    Ok(HttpResponse::Ok().json(kits))
}

#[instrument(skip(auth, state, data), fields(user_id = auth.user_id))]
pub async fn create_brand_kit(
    auth: AuthContext,
    state: web::Data<AppState>,
    data: web::Json<NewBrandKitRequest>,
) -> Result<impl Responder, AppError> {
    let kit = state
        .brand_kit_handler
        .create_brand_kit(&auth, data.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(kit))
}

#[instrument(skip(auth, state), fields(user_id = auth.user_id))]
pub async fn get_brand_kit_defaults(
    auth: AuthContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let defaults = state.brand_kit_handler.defaults(&auth)?;
    Ok(HttpResponse::Ok().json(defaults))
}

#[instrument(skip(auth, state, kit_id), fields(user_id = auth.user_id))]
pub async fn get_brand_kit(
    auth: AuthContext,
    state: web::Data<AppState>,
    kit_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let kit = state
        .brand_kit_handler
        .get_brand_kit(&auth, kit_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(kit))
}

#[instrument(skip(auth, state, kit_id, data), fields(user_id = auth.user_id))]
pub async fn update_brand_kit(
    auth: AuthContext,
    state: web::Data<AppState>,
    kit_id: web::Path<i64>,
    data: web::Json<UpdateBrandKitRequest>,
) -> Result<impl Responder, AppError> {
    let kit = state
        .brand_kit_handler
        .update_brand_kit(&auth, kit_id.into_inner(), data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(kit))
}

#[instrument(skip(auth, state, kit_id), fields(user_id = auth.user_id))]
pub async fn delete_brand_kit(
    auth: AuthContext,
    state: web::Data<AppState>,
    kit_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    state
        .brand_kit_handler
        .delete_brand_kit(&auth, kit_id.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[instrument(skip(auth, state, kit_id), fields(user_id = auth.user_id))]
pub async fn duplicate_brand_kit(
    auth: AuthContext,
    state: web::Data<AppState>,
    kit_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let kit = state
        .brand_kit_handler
        .duplicate_brand_kit(&auth, kit_id.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(kit))
}

#[instrument(skip(auth, state, kit_id), fields(user_id = auth.user_id))]
pub async fn export_brand_kit(
    auth: AuthContext,
    state: web::Data<AppState>,
    kit_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let export = state
        .brand_kit_handler
        .export_brand_kit(&auth, kit_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(export))
}

#[instrument(skip(auth, state, data), fields(user_id = auth.user_id))]
pub async fn import_brand_kit(
    auth: AuthContext,
    state: web::Data<AppState>,
    data: web::Json<ImportBrandKitRequest>,
) -> Result<impl Responder, AppError> {
    let kit = state
        .brand_kit_handler
        .import_brand_kit(&auth, data.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(kit))
}
