//! Admin session endpoints and the cookie plumbing behind them.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use pf_core::{AppError, Session, SESSION_TTL_DAYS};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::handlers::AppState;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Option<Session>> for SessionStatus {
    fn from(session: Option<Session>) -> Self {
        match session {
            Some(s) => Self {
                authenticated: true,
                username: Some(s.username),
                expires_at: Some(s.expires_at),
            },
            None => Self {
                authenticated: false,
                username: None,
                expires_at: None,
            },
        }
    }
}

/// The caller's session, if the request carries a valid `auth_token`.
pub fn current_session(req: &HttpRequest, data: &AppState) -> Option<Session> {
    let cookie = req.cookie(AUTH_COOKIE)?;
    data.auth.read_session(cookie.value())
}

pub fn require_admin(req: &HttpRequest, data: &AppState) -> Result<Session, ApiError> {
    current_session(req, data)
        .ok_or_else(|| AppError::Unauthorized("admin session required".into()).into())
}

fn session_cookie(value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .finish()
}

pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let LoginRequest { username, password } = body.into_inner();
    let rejected = || ApiError(AppError::Unauthorized("invalid username or password".into()));

    let Some(user) = data.users.find_user(username.trim()).await? else {
        log::warn!("login attempt for unknown user '{}'", username.trim());
        return Err(rejected());
    };
    if !data.auth.verify_password(&password, &user.password_hash).await {
        log::warn!("failed login for '{}'", user.username);
        return Err(rejected());
    }

    let (token, session) = data.auth.issue_session(&user.username)?;
    log::info!("admin '{}' logged in", session.username);
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(
            token,
            Duration::days(SESSION_TTL_DAYS),
            data.cookie_secure,
        ))
        .json(SessionStatus::from(Some(session))))
}

pub async fn logout(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(session_cookie(String::new(), Duration::ZERO, data.cookie_secure))
        .json(SessionStatus::from(None))
}

pub async fn session(data: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().json(SessionStatus::from(current_session(&req, &data)))
}
