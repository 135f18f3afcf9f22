use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::Response,
    routing::get,
};
use chrono::Utc;

use tutorhub_auth::{User, UserRole};
use tutorhub_core::{DomainError, UserId};

use crate::app::dto::{self, RegisterUserRequest};
use crate::app::errors::{ApiResult, json_ok};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/:id", get(get_user))
}

/// `POST /users` — the one public write; accounts are created before any
/// token exists.
pub async fn register_user(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterUserRequest>,
) -> ApiResult<Response> {
    let role: UserRole = body.role.parse()?;
    let user = User::register(UserId::new(), body.name, body.email, role, Utc::now())?;
    let user = services.store().insert_user(user).await?;
    Ok(json_ok(StatusCode::CREATED, dto::user_to_json(&user)))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: UserId = id.parse()?;
    let user = services
        .store()
        .user(id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("user {id}")))?;
    Ok(json_ok(StatusCode::OK, dto::user_to_json(&user)))
}
