use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::StatusCode,
    response::Response,
    routing::get,
};
use serde_json::Value;

use tutorhub_core::{CourseId, DomainError, UserId};

use crate::app::dto::{self, CreateEnrollmentRequest};
use crate::app::errors::{ApiResult, json_ok};
use crate::app::services::AppServices;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_enrollments).post(create_enrollment))
}

/// `POST /enrollments` — direct (non-checkout) enrollment; idempotent.
pub async fn create_enrollment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CreateEnrollmentRequest>,
) -> ApiResult<Response> {
    let learner_id: UserId = body.learner_id.parse()?;
    if learner_id != auth.user_id() {
        return Err(DomainError::forbidden(
            "enrollments can only be created for your own account",
        ).into());
    }
    let course_id: CourseId = body.course_id.parse()?;

    let enrollment = services
        .checkout()
        .fulfill_enrollment(learner_id, course_id)
        .await?;
    Ok(json_ok(
        StatusCode::CREATED,
        dto::enrollment_to_json(&enrollment),
    ))
}

/// `GET /enrollments` — the authenticated learner's enrollments.
pub async fn list_enrollments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Response> {
    let enrollments = services.store().enrollments_for(auth.user_id()).await?;
    let body: Vec<Value> = enrollments.iter().map(dto::enrollment_to_json).collect();
    Ok(json_ok(StatusCode::OK, Value::Array(body)))
}
