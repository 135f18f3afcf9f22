use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tutorhub_core::DomainError;

/// Handler error type; lets handlers bubble domain and store errors
/// with `?` and still produce the uniform error body.
pub struct ApiError(DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

impl<E> From<E> for ApiError
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        domain_error_to_response(self.0)
    }
}

/// Map the domain error taxonomy onto HTTP statuses.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", what),
        DomainError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unauthorized => {
            json_error(StatusCode::UNAUTHORIZED, "unauthorized", "authentication required")
        }
        DomainError::Upstream(msg) => json_error(StatusCode::BAD_GATEWAY, "upstream_error", msg),
        DomainError::Internal(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    details: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "details": details.into(),
        })),
    )
        .into_response()
}

pub fn json_ok(status: StatusCode, data: serde_json::Value) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": true,
            "data": data,
        })),
    )
        .into_response()
}
