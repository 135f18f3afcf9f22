use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::Response,
    routing::{get, patch, post},
};
use chrono::Utc;
use serde_json::{Value, json};

use tutorhub_catalog::Tutor;
use tutorhub_core::{
    BookingId, CourseId, DomainError, ReviewId, ReviewRequestId, TutorId, UserId,
};
use tutorhub_reviews::{Review, ReviewRequest};

use crate::app::dto::{
    self, CreateReviewInviteRequest, CreateReviewRequest, ModerateReviewRequest,
};
use crate::app::errors::{ApiResult, json_ok};
use crate::app::services::AppServices;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_review))
        .route("/:id", patch(moderate_review).delete(delete_review))
}

pub fn requests_router() -> Router {
    Router::new()
        .route("/", post(create_invite))
        .route("/pending", get(pending_invites))
}

async fn acting_tutor(
    services: &AppServices,
    auth: &AuthContext,
) -> Result<Tutor, DomainError> {
    services
        .store()
        .tutor_for_user(auth.user_id())
        .await
        .map_err(DomainError::from)?
        .ok_or_else(|| DomainError::forbidden("no tutor profile for this account"))
}

/// `POST /reviews` — submit a pending review for one of your bookings.
pub async fn create_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CreateReviewRequest>,
) -> ApiResult<Response> {
    let reviewer_id: UserId = body.reviewer_id.parse()?;
    if reviewer_id != auth.user_id() {
        return Err(DomainError::forbidden(
            "reviews can only be submitted as yourself",
        ).into());
    }
    let booking_id: BookingId = body.booking_id.parse()?;
    let tutor_id: TutorId = body.tutor_id.parse()?;
    let course_id: CourseId = body.course_id.parse()?;

    let (booking, _) = services
        .store()
        .booking(booking_id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("booking {booking_id}")))?;
    if booking.learner_id != reviewer_id {
        return Err(DomainError::forbidden("booking belongs to another learner").into());
    }
    if booking.tutor_id != tutor_id || booking.course_id != course_id {
        return Err(DomainError::validation(
            "tutor and course must match the reviewed booking",
        ).into());
    }

    let review = Review::submit(
        ReviewId::new(),
        booking_id,
        reviewer_id,
        tutor_id,
        course_id,
        body.rating,
        body.comment,
        Utc::now(),
    )?;
    let review = services.store().insert_review(review).await?;
    Ok(json_ok(StatusCode::CREATED, dto::review_to_json(&review)))
}

/// `PATCH /reviews/:id` — `pending → accepted|rejected`, owning tutor only.
pub async fn moderate_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<ModerateReviewRequest>,
) -> ApiResult<Response> {
    let id: ReviewId = id.parse()?;
    let mut review = services
        .store()
        .review(id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("review {id}")))?;
    let tutor = acting_tutor(&services, &auth).await?;

    match body.status.as_str() {
        "accepted" => review.accept(tutor.id, Utc::now())?,
        "rejected" => review.reject(tutor.id)?,
        other => {
            return Err(DomainError::validation(format!(
                "status must be accepted or rejected; got '{other}'"
            )).into());
        }
    }

    let review = services.store().update_review(review).await?;
    Ok(json_ok(StatusCode::OK, dto::review_to_json(&review)))
}

/// `DELETE /reviews/:id` — owning tutor only.
pub async fn delete_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: ReviewId = id.parse()?;
    let review = services
        .store()
        .review(id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("review {id}")))?;
    let tutor = acting_tutor(&services, &auth).await?;
    if review.tutor_id != tutor.id {
        return Err(DomainError::forbidden(
            "only the reviewed tutor may delete this review",
        ).into());
    }

    services.store().delete_review(id).await?;
    Ok(json_ok(StatusCode::OK, json!({ "deleted": true })))
}

/// `POST /review-requests` — a tutor invites a student to review a course.
pub async fn create_invite(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CreateReviewInviteRequest>,
) -> ApiResult<Response> {
    let tutor_id: TutorId = body.tutor_id.parse()?;
    let tutor = acting_tutor(&services, &auth).await?;
    if tutor.id != tutor_id {
        return Err(DomainError::forbidden(
            "invites can only be sent from your own tutor profile",
        ).into());
    }

    let student_id: UserId = body.student_id.parse()?;
    services
        .store()
        .user(student_id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("user {student_id}")))?;
    let course_id: CourseId = body.course_id.parse()?;

    let request = ReviewRequest::invite(
        ReviewRequestId::new(),
        student_id,
        course_id,
        tutor_id,
        Utc::now(),
    );
    let request = services.store().insert_review_request(request).await?;
    Ok(json_ok(
        StatusCode::CREATED,
        dto::review_request_to_json(&request),
    ))
}

/// `GET /review-requests/pending` — the authenticated student's invites
/// that no review of theirs satisfies yet.
pub async fn pending_invites(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Response> {
    let requests = services.store().review_requests_for(auth.user_id()).await?;
    let mut pending: Vec<Value> = Vec::new();
    for request in &requests {
        let satisfied = services
            .store()
            .review_exists(request.student_id, request.course_id, request.tutor_id)
            .await?;
        if !satisfied {
            pending.push(dto::review_request_to_json(request));
        }
    }
    Ok(json_ok(StatusCode::OK, Value::Array(pending)))
}
