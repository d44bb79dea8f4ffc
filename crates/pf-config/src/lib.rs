//! # pf-config
//!
//! Layered application configuration: built-in defaults, then a `.env`
//! file, then `PORTFOLIO__*` environment variables.
//!
//! ```text
//! PORTFOLIO__PORT=3000
//! PORTFOLIO__DATABASE_URL=sqlite:/var/lib/portfolio/site.db?mode=rwc
//! PORTFOLIO__ADMIN_PASSWORD_HASH='$argon2id$v=19$...'
//! ```

use config::{Config, Environment};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "PORTFOLIO";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Raw, deserializable shape. Secrets are wrapped right after loading.
#[derive(Debug, Deserialize)]
struct RawConfig {
    host: String,
    port: u16,
    database_url: String,
    max_connections: u32,
    site_url: String,
    site_title: String,
    site_description: String,
    admin_username: String,
    admin_password_hash: Option<String>,
    session_secret: Option<String>,
    cookie_secure: bool,
    cors_origin: Option<String>,
}

#[derive(Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Absolute base URL used in the feed and sitemap, without trailing slash
    pub site_url: String,
    pub site_title: String,
    pub site_description: String,
    pub admin_username: String,
    /// Argon2 PHC string of the bootstrap admin's password
    pub admin_password_hash: Option<SecretString>,
    /// HMAC key for session tokens; a random one is used when absent
    pub session_secret: Option<SecretString>,
    pub cookie_secure: bool,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => log::warn!("ignoring unreadable .env file: {e}"),
        }
        Self::from_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
    }

    /// Builds the configuration from defaults overlaid with `source`.
    pub fn from_source<S>(source: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let raw: RawConfig = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("database_url", "sqlite:portfolio.db?mode=rwc")?
            .set_default("max_connections", 5)?
            .set_default("site_url", "http://localhost:8080")?
            .set_default("site_title", "Portfolio")?
            .set_default("site_description", "Projects, writings and build logs")?
            .set_default("admin_username", "admin")?
            .set_default("cookie_secure", false)?
            .add_source(source)
            .build()?
            .try_deserialize()?;

        raw.try_into()
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        if raw.admin_username.trim().is_empty() {
            return Err(ConfigError::Invalid("admin_username must not be empty".into()));
        }
        if !(raw.site_url.starts_with("http://") || raw.site_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "site_url must be an absolute http(s) URL, got '{}'",
                raw.site_url
            )));
        }

        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Ok(Self {
            host: raw.host,
            port: raw.port,
            database_url: raw.database_url,
            max_connections: raw.max_connections,
            site_url: raw.site_url.trim_end_matches('/').to_string(),
            site_title: raw.site_title,
            site_description: raw.site_description,
            admin_username: raw.admin_username.trim().to_string(),
            admin_password_hash: non_empty(raw.admin_password_hash).map(SecretString::from),
            session_secret: non_empty(raw.session_secret).map(SecretString::from),
            cookie_secure: raw.cookie_secure,
            cors_origin: non_empty(raw.cors_origin),
        })
    }
}
