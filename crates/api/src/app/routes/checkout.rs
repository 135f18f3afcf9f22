use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::Response,
    routing::{get, post},
};

use tutorhub_core::{Amount, CourseId, DomainError, TutorId};
use tutorhub_infra::CheckoutRequest;
use tutorhub_payments::Fulfillment;
use tutorhub_scheduling::SessionKind;

use crate::app::dto::{self, InitiateCheckoutRequest};
use crate::app::errors::{ApiResult, json_ok};
use crate::app::services::AppServices;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(initiate))
        .route("/sessions/:id", get(resolve_session))
        .route("/sessions/:id/fulfill", post(fulfill_session))
}

fn fulfillment_from_body(body: &InitiateCheckoutRequest) -> Result<Fulfillment, DomainError> {
    match body.fulfillment_type.as_str() {
        "enrollment" => {
            if body.tutor_id.is_some() || body.session_date.is_some() || body.session_kind.is_some()
            {
                return Err(DomainError::validation(
                    "session fields are not allowed for enrollment checkout",
                ));
            }
            Ok(Fulfillment::Enrollment)
        }
        "session" => {
            let tutor_id: TutorId = body
                .tutor_id
                .as_deref()
                .ok_or_else(|| DomainError::validation("session checkout requires tutor_id"))?
                .parse()?;
            let scheduled_at = body.session_date.ok_or_else(|| {
                DomainError::validation("session checkout requires session_date")
            })?;
            let kind = match body.session_kind.as_deref() {
                Some(raw) => raw.parse()?,
                None => SessionKind::Individual,
            };
            Ok(Fulfillment::Session {
                tutor_id,
                scheduled_at,
                kind,
            })
        }
        other => Err(DomainError::validation(format!(
            "fulfillment_type must be enrollment or session; got '{other}'"
        ))),
    }
}

/// `POST /checkout` — opens a hosted payment session for the authenticated
/// learner and returns the redirect.
pub async fn initiate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
    Json(body): Json<InitiateCheckoutRequest>,
) -> ApiResult<Response> {
    let course_id: CourseId = body.course_id.parse()?;
    let amount = Amount::positive(body.amount_minor)?;
    let fulfillment = fulfillment_from_body(&body)?;

    let redirect = services
        .checkout()
        .initiate(
            auth.user_id(),
            CheckoutRequest {
                course_id,
                amount,
                fulfillment,
            },
        )
        .await?;
    Ok(json_ok(StatusCode::CREATED, dto::redirect_to_json(&redirect)))
}

/// `GET /checkout/sessions/:id` — pure read of the session's purchase
/// intent.
pub async fn resolve_session(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let intent = services.checkout().resolve(&id).await?;
    Ok(json_ok(StatusCode::OK, dto::intent_to_json(&intent)))
}

/// `POST /checkout/sessions/:id/fulfill` — one fulfillment attempt.
pub async fn fulfill_session(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let outcome = services
        .checkout()
        .fulfill(Some(auth.user_id()), &id)
        .await?;
    Ok(json_ok(StatusCode::OK, dto::outcome_to_json(&outcome)))
}
