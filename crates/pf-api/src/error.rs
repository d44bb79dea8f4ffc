//! HTTP mapping for `AppError`.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use pf_core::AppError;
use serde_json::json;

/// `AppError` as a response: `{"error": "<message>"}` with a matching status.
///
/// Server-side failures are logged in full and answered with a generic
/// message so storage details never reach the client.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match &self.0 {
            AppError::Connection(detail) => {
                log::error!("storage unavailable: {detail}");
                "service temporarily unavailable".to_string()
            }
            AppError::Internal(detail) => {
                log::error!("internal error: {detail}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(status).json(json!({ "error": message }))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Largest accepted JSON body.
const JSON_LIMIT: usize = 1 << 20;

/// Malformed bodies answer with the same `{"error": ..}` shape as every
/// other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| ApiError(AppError::validation(err.to_string())).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError(AppError::validation(err.to_string())).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (AppError::validation("title is required"), 400),
            (AppError::Unauthorized("no session".into()), 401),
            (AppError::not_found("Project", "x"), 404),
            (AppError::Conflict("taken".into()), 409),
            (AppError::Connection("pool closed".into()), 503),
            (AppError::Internal("boom".into()), 500),
        ];
        for (err, code) in cases {
            assert_eq!(ApiError(err).status_code().as_u16(), code);
        }
    }

    #[actix_web::test]
    async fn internal_details_are_hidden() {
        let resp = ApiError(AppError::Internal("disk sector 7 on fire".into())).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("internal server error"));
        assert!(!body.contains("sector"));
    }
}
