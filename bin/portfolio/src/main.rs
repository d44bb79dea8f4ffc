//! # Portfolio Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use chrono::Utc;
use pf_api::{configure_routes, middleware, AppState};
use pf_config::AppConfig;
use pf_core::traits::UserRepo;
use pf_core::User;
use pf_ui::SiteInfo;
use secrecy::ExposeSecret;

// Feature-gated imports
#[cfg(feature = "db-sqlite")]
use pf_db_sqlite::SqliteDocumentStore;

#[cfg(feature = "auth-simple")]
use pf_auth_simple::SimpleAuthProvider;

/// Makes sure the configured admin can log in. A configured hash always
/// wins over the stored one.
async fn bootstrap_admin(users: &dyn UserRepo, config: &AppConfig) -> anyhow::Result<()> {
    match &config.admin_password_hash {
        Some(hash) => {
            users
                .upsert_user(User {
                    username: config.admin_username.clone(),
                    password_hash: hash.expose_secret().to_string(),
                    created_at: Utc::now(),
                })
                .await
                .context("storing the admin account")?;
            log::info!("admin account '{}' is ready", config.admin_username);
        }
        None => {
            if users.find_user(&config.admin_username).await?.is_none() {
                log::warn!(
                    "no admin account and PORTFOLIO__ADMIN_PASSWORD_HASH is unset; logins are disabled"
                );
            }
        }
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = AppConfig::load().context("loading configuration")?;

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(
        SqliteDocumentStore::connect(&config.database_url, config.max_connections)
            .await
            .with_context(|| format!("opening {}", config.database_url))?,
    );

    bootstrap_admin(store.as_ref(), &config).await?;

    // 2. Initialize Auth Implementation
    #[cfg(feature = "auth-simple")]
    let auth = match &config.session_secret {
        Some(secret) => SimpleAuthProvider::new(secret.expose_secret().as_bytes()),
        None => {
            log::warn!("PORTFOLIO__SESSION_SECRET is unset; sessions end on restart");
            SimpleAuthProvider::with_random_secret()?
        }
    };

    // 3. Wrap in AppState (dynamic dispatch over the selected plugins)
    let state = web::Data::new(AppState {
        store: store.clone(),
        users: store.clone(),
        auth: Box::new(auth),
        site: SiteInfo {
            url: config.site_url.clone(),
            title: config.site_title.clone(),
            description: config.site_description.clone(),
        },
        cookie_secure: config.cookie_secure,
    });

    let cors_origin = config.cors_origin.clone();
    let (host, port) = config.bind_address();
    log::info!("portfolio starting on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::security_headers())
            .wrap(middleware::cors_policy(cors_origin.as_deref()))
            .wrap(middleware::standard_middleware())
            .configure(configure_routes)
    })
    .bind((host, port))?
    .run()
    .await?;

    // The server has drained its workers; nothing uses the pool anymore.
    store.close().await;
    log::info!("portfolio stopped");
    Ok(())
}
