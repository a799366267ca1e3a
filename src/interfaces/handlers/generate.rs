use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{entities::{auth::AuthContext, generation::GenerateRequest}, errors::AppError, AppState};

#[instrument(skip(auth, state, data), fields(user_id = auth.user_id))]
pub async fn generate_image(
    auth: AuthContext,
    state: web::Data<AppState>,
    data: web::Json<GenerateRequest>,
) -> Result<impl Responder, AppError> {
    let response = state
        .generation_handler
        .generate(&auth, data.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(response))
}
