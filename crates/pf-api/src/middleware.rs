//! portfolio/crates/pf-api/src/middleware.rs Middleware
//!
//! Logging, CORS and security headers wrapped around every route.

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};

// Returns the request logger for the API.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

/// Configures CORS. Without an origin only same-origin requests pass;
/// with one, that origin may call the API with the session cookie.
pub fn cors_policy(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .supports_credentials()
            .max_age(3600),
        None => Cors::default(),
    }
}

pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::REFERRER_POLICY, "strict-origin-when-cross-origin"))
        .add((header::X_FRAME_OPTIONS, "DENY"))
}
