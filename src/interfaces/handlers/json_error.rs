use actix_web::{http::StatusCode, HttpResponse};

/// Error body with the same shape `AppError` renders.
pub fn json_error(status: StatusCode, error: &str, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "error": error,
        "message": message
    }))
}
