use actix_web::web;

use crate::handlers::catalog;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/catalog")
            .service(
                web::resource("/products/variations")
                    .route(web::post().to(catalog::product_variations))
            )
            .service(
                web::resource("/products/background")
                    .route(web::post().to(catalog::product_background))
            )
            .service(
                web::resource("/categories/banner")
                    .route(web::post().to(catalog::category_banner))
            )
    );
}
