use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::Response,
    routing::get,
};
use chrono::Utc;
use serde_json::Value;

use tutorhub_auth::UserRole;
use tutorhub_catalog::Tutor;
use tutorhub_core::{DomainError, TutorId, UserId};
use tutorhub_reviews::ReviewStatus;

use crate::app::dto::{self, CreateTutorRequest};
use crate::app::errors::{ApiResult, json_ok};
use crate::app::services::AppServices;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tutors).post(create_tutor))
        .route("/:id", get(get_tutor))
        .route("/:id/reviews", get(tutor_reviews))
}

pub async fn create_tutor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CreateTutorRequest>,
) -> ApiResult<Response> {
    let user_id: UserId = body.user_id.parse()?;
    if user_id != auth.user_id() {
        return Err(DomainError::forbidden(
            "a tutor profile can only be created for your own account",
        ).into());
    }

    let user = services
        .store()
        .user(user_id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("user {user_id}")))?;
    if user.role != UserRole::Tutor {
        return Err(DomainError::forbidden("account is not a tutor").into());
    }
    if services.store().tutor_for_user(user_id).await?.is_some() {
        return Err(DomainError::conflict("tutor profile already exists").into());
    }

    let tutor = Tutor::create(
        TutorId::new(),
        user_id,
        body.name,
        body.headline.unwrap_or_default(),
        Utc::now(),
    )?;
    let tutor = services.store().insert_tutor(tutor).await?;
    Ok(json_ok(StatusCode::CREATED, dto::tutor_to_json(&tutor)))
}

pub async fn list_tutors(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Response> {
    let tutors = services.store().tutors().await?;
    let body: Vec<Value> = tutors.iter().map(dto::tutor_to_json).collect();
    Ok(json_ok(StatusCode::OK, Value::Array(body)))
}

pub async fn get_tutor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: TutorId = id.parse()?;
    let tutor = services
        .store()
        .tutor(id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("tutor {id}")))?;
    Ok(json_ok(StatusCode::OK, dto::tutor_to_json(&tutor)))
}

/// `GET /tutors/:id/reviews` — the owning tutor sees everything including
/// pending submissions; anyone else sees accepted reviews only.
pub async fn tutor_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: TutorId = id.parse()?;
    let tutor = services
        .store()
        .tutor(id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("tutor {id}")))?;

    let is_owner = tutor.user_id == auth.user_id();
    let reviews = services.store().reviews_for_tutor(id).await?;
    let body: Vec<Value> = reviews
        .iter()
        .filter(|r| is_owner || r.status == ReviewStatus::Accepted)
        .map(dto::review_to_json)
        .collect();
    Ok(json_ok(StatusCode::OK, Value::Array(body)))
}
