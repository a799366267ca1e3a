use actix_web::web;

use crate::handlers::{home::home, media::serve_upload, system::list_models};

mod admin;
mod brand_kits;
mod catalog;
mod generation;
mod json_error;
mod media;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);
    cfg.service(serve_upload);

    cfg.service(
        web::scope("/api/v1")
            .configure(generation::config_routes)
            .configure(brand_kits::config_routes)
            .configure(media::config_routes)
            .configure(catalog::config_routes)
            .configure(admin::config_routes)
            .service(list_models)
    );

    cfg.configure(json_error::config_routes);
}
