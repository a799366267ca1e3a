use std::collections::HashMap;

use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{auth::AuthContext, history::Pagination},
    errors::AppError,
    AppState,
};

#[instrument(skip(auth, state), fields(user_id = auth.user_id))]
pub async fn get_usage(
    auth: AuthContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let stats = state.generation_handler.usage_stats(&auth).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[instrument(skip(auth, state, query), fields(user_id = auth.user_id))]
pub async fn get_history(
    auth: AuthContext,
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    let pagination = Pagination::from_query(
        query.get("page").map(String::as_str),
        query.get("per_page").map(String::as_str),
    );

    let page = state.generation_handler.list_history(&auth, pagination).await?;
    Ok(HttpResponse::Ok().json(page))
}
