//! # tc-api
//!
//! The web routing and orchestration layer for Town Chronicle.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

/// Configures the JSON API routes.
///
/// # Developer Note
/// Everything sits under `/api` so the binary can serve other content beside it.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api")
                // Towns
                .route("/towns", web::post().to(handlers::create_town))
                .route("/towns/mine", web::get().to(handlers::my_towns))
                .route("/towns/share/{share_id}", web::get().to(handlers::shared_town))
                .route("/towns/{town_id}", web::put().to(handlers::update_town))
                .route("/towns/{town_id}", web::delete().to(handlers::delete_town))
                .route("/towns/{town_id}/regenerate", web::post().to(handlers::regenerate_town))
                .route("/towns/{town_id}/crests", web::get().to(handlers::town_crests))
                // Stories
                .route("/stories", web::post().to(handlers::create_story))
                .route(
                    "/stories/town/{town_id}/location/{location}",
                    web::get().to(handlers::stories_at_location),
                )
                .route("/stories/{story_id}", web::delete().to(handlers::delete_story)),
        );
}
