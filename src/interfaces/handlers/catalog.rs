use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{
        auth::AuthContext,
        catalog::{CategoryBannerRequest, ProductBackgroundRequest, ProductVariationRequest},
    },
    errors::AppError,
    AppState,
};

#[instrument(skip(auth, state, data), fields(user_id = auth.user_id))]
pub async fn product_variations(
    auth: AuthContext,
    state: web::Data<AppState>,
    data: web::Json<ProductVariationRequest>,
) -> Result<impl Responder, AppError> {
    let batch = state
        .generation_handler
        .generate_product_variations(&auth, data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(batch))
}

#[instrument(skip(auth, state, data), fields(user_id = auth.user_id))]
pub async fn product_background(
    auth: AuthContext,
    state: web::Data<AppState>,
    data: web::Json<ProductBackgroundRequest>,
) -> Result<impl Responder, AppError> {
    let response = state
        .generation_handler
        .generate_product_background(&auth, data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(auth, state, data), fields(user_id = auth.user_id))]
pub async fn category_banner(
    auth: AuthContext,
    state: web::Data<AppState>,
    data: web::Json<CategoryBannerRequest>,
) -> Result<impl Responder, AppError> {
    let response = state
        .generation_handler
        .generate_category_banner(&auth, data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}
