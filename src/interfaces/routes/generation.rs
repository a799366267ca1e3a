use actix_web::web;

use crate::handlers::{generate, history};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/generate")
            .route(web::post().to(generate::generate_image))
    )
    .service(
        web::resource("/usage")
            .route(web::get().to(history::get_usage))
    )
    .service(
        web::resource("/history")
            .route(web::get().to(history::get_history))
    );
}
