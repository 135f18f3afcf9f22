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

use tutorhub_catalog::Course;
use tutorhub_core::{Amount, CourseId, DomainError, TutorId};

use crate::app::dto::{self, CreateCourseRequest};
use crate::app::errors::{ApiResult, json_ok};
use crate::app::services::AppServices;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/:id", get(get_course))
}

pub async fn create_course(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CreateCourseRequest>,
) -> ApiResult<Response> {
    let tutor_id: TutorId = body.tutor_id.parse()?;
    let tutor = services
        .store()
        .tutor(tutor_id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("tutor {tutor_id}")))?;
    if tutor.user_id != auth.user_id() {
        return Err(DomainError::forbidden(
            "courses can only be published under your own tutor profile",
        ).into());
    }

    let price = Amount::positive(body.price_minor)?;
    let session_rate = Amount::positive(body.session_rate_minor)?;
    let course = Course::publish(
        CourseId::new(),
        tutor_id,
        body.title,
        body.description.unwrap_or_default(),
        price,
        session_rate,
        Utc::now(),
    )?;
    let course = services.store().insert_course(course).await?;
    Ok(json_ok(StatusCode::CREATED, dto::course_to_json(&course)))
}

pub async fn list_courses(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Response> {
    let courses = services.store().courses().await?;
    let body: Vec<Value> = courses.iter().map(dto::course_to_json).collect();
    Ok(json_ok(StatusCode::OK, Value::Array(body)))
}

pub async fn get_course(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: CourseId = id.parse()?;
    let course = services
        .store()
        .course(id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("course {id}")))?;
    Ok(json_ok(StatusCode::OK, dto::course_to_json(&course)))
}
