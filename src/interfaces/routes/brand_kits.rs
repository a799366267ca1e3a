use actix_web::web;

use crate::handlers::brand_kits;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/brand-kits")
            .service(
                web::resource("")
                    .route(web::get().to(brand_kits::list_brand_kits))
                    .route(web::post().to(brand_kits::create_brand_kit))
            )
            .service(
                web::resource("/defaults")
                    .route(web::get().to(brand_kits::get_brand_kit_defaults))
            )
            .service(
                web::resource("/import")
                    .route(web::post().to(brand_kits::import_brand_kit))
            )
            .service(
                web::resource("/{kit_id}")
                    .route(web::get().to(brand_kits::get_brand_kit))
                    .route(web::put().to(brand_kits::update_brand_kit))
                    .route(web::delete().to(brand_kits::delete_brand_kit))
            )
            .service(
                web::resource("/{kit_id}/duplicate")
                    .route(web::post().to(brand_kits::duplicate_brand_kit))
            )
            .service(
                web::resource("/{kit_id}/export")
                    .route(web::get().to(brand_kits::export_brand_kit))
            )
    );
}
