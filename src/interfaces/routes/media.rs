use actix_web::web;

use crate::handlers::media;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/media")
            .service(
                web::resource("")
                    .route(web::post().to(media::upload_media))
            )
            .service(
                web::resource("/{asset_id}")
                    .route(web::get().to(media::get_media))
            )
    );
}
