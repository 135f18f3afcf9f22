use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::Response,
    routing::get,
};
use serde_json::Value;

use tutorhub_core::{Amount, BookingId, CourseId, DomainError, TutorId, UserId};
use tutorhub_infra::BookingRequest;
use tutorhub_scheduling::SessionKind;

use crate::app::dto::{self, CreateBookingRequest};
use crate::app::errors::{ApiResult, json_ok};
use crate::app::services::AppServices;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/:id", get(get_booking))
}

/// `POST /bookings` — direct (non-checkout) booking with its payment.
pub async fn create_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<CreateBookingRequest>,
) -> ApiResult<Response> {
    let learner_id: UserId = body.learner_id.parse()?;
    if learner_id != auth.user_id() {
        return Err(DomainError::forbidden(
            "bookings can only be created for your own account",
        ).into());
    }
    let tutor_id: TutorId = body.tutor_id.parse()?;
    let course_id: CourseId = body.course_id.parse()?;
    let kind: Option<SessionKind> = match body.session_type.as_deref() {
        Some(raw) => Some(raw.parse()?),
        None => None,
    };
    let amount = match body.amount_minor {
        Some(minor) => Some(Amount::positive(minor)?),
        None => None,
    };

    let (booking, payment) = services
        .checkout()
        .fulfill_booking(BookingRequest {
            learner_id,
            tutor_id,
            course_id,
            scheduled_at: body.session_date,
            duration_min: body.duration_min,
            kind,
            amount,
            transaction_ref: body.payment_session_id,
        })
        .await?;
    Ok(json_ok(
        StatusCode::CREATED,
        dto::booking_to_json(&booking, &payment),
    ))
}

/// `GET /bookings` — the authenticated learner's bookings with payments.
pub async fn list_bookings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Response> {
    let bookings = services.store().bookings_for(auth.user_id()).await?;
    let body: Vec<Value> = bookings
        .iter()
        .map(|(b, p)| dto::booking_to_json(b, p))
        .collect();
    Ok(json_ok(StatusCode::OK, Value::Array(body)))
}

pub async fn get_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: BookingId = id.parse()?;
    let (booking, payment) = services
        .store()
        .booking(id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("booking {id}")))?;
    Ok(json_ok(StatusCode::OK, dto::booking_to_json(&booking, &payment)))
}
