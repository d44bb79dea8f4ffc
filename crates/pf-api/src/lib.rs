//! # pf-api
//!
//! The web routing and orchestration layer for the portfolio backend.

pub mod auth;
pub mod error;
pub mod feeds;
pub mod handlers;
pub mod middleware;

use actix_web::{web, Scope};
use pf_core::{Entity, Project, Track, Writing};

pub use handlers::AppState;

/// Configures every route of the site.
///
/// # Developer Note
/// The content API lives under `/api`; the generated documents sit at the
/// root where crawlers and feed readers expect them.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(error::json_config())
        .app_data(error::query_config())
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .service(
                    web::scope("/auth")
                        .route("/login", web::post().to(auth::login))
                        .route("/logout", web::post().to(auth::logout))
                        .route("/session", web::get().to(auth::session)),
                )
                .service(content_scope::<Project>("/projects"))
                .service(content_scope::<Writing>("/writings"))
                .service(
                    content_scope::<Track>("/build")
                        .service(
                            web::resource("/{slug}/updates")
                                .route(web::post().to(handlers::append_update)),
                        )
                        .service(
                            web::resource("/{slug}/milestones")
                                .route(web::post().to(handlers::append_milestone)),
                        ),
                ),
        )
        .route("/feed.xml", web::get().to(feeds::feed))
        .route("/sitemap.xml", web::get().to(feeds::sitemap))
        .route("/robots.txt", web::get().to(feeds::robots));
}

/// CRUD routes for one entity kind. `/facets` is registered ahead of
/// `/{slug}` so it is never read as a slug.
fn content_scope<E: Entity>(path: &str) -> Scope {
    web::scope(path)
        .service(
            web::resource("")
                .route(web::get().to(handlers::list::<E>))
                .route(web::post().to(handlers::create::<E>)),
        )
        .service(web::resource("/facets").route(web::get().to(handlers::list_facets::<E>)))
        .service(
            web::resource("/{slug}")
                .route(web::get().to(handlers::get_one::<E>))
                .route(web::put().to(handlers::update::<E>))
                .route(web::delete().to(handlers::delete::<E>)),
        )
}
