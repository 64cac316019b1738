// API route configuration

use crate::api::handlers;
use crate::api::error::ApiError;
use actix_web::web;

/// Malformed JSON bodies get the same `{"error": ...}` shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

/// Query strings that fail to deserialize, e.g. a repeated `q`.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/api")
                // Add-game workflow (external insert executable)
                .route("/jogos/adicionar", web::post().to(handlers::add_game))
                // Steam proxy; details must be registered before the category catch-all
                .route(
                    "/steam/details/{appid}",
                    web::get().to(handlers::steam_details),
                )
                .route("/steam/{category}", web::get().to(handlers::steam_featured))
                // Legacy reviews
                .route("/reviews", web::post().to(handlers::create_review))
                .route("/reviews/{game_id}", web::get().to(handlers::list_reviews))
                // Local catalog; search before the id lookup
                .route("/jogos/busca", web::get().to(handlers::search_catalog))
                .route("/jogos/{appid}", web::get().to(handlers::catalog_detail)),
        );
}
