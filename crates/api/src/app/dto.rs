//! Request bodies and response JSON shapes.
//!
//! Request DTOs are strict: unknown fields are rejected, ids arrive as
//! strings and are parsed into their typed form before any handler logic
//! runs.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use tutorhub_auth::User;
use tutorhub_catalog::{Course, Tutor};
use tutorhub_infra::{CheckoutRedirect, FulfillmentOutcome};
use tutorhub_learning::Enrollment;
use tutorhub_payments::{Fulfillment, PurchaseIntent};
use tutorhub_reviews::{Review, ReviewRequest};
use tutorhub_scheduling::{Booking, Payment};

// --- request bodies ---

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTutorRequest {
    pub user_id: String,
    pub name: String,
    pub headline: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCourseRequest {
    pub tutor_id: String,
    pub title: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub session_rate_minor: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitiateCheckoutRequest {
    pub course_id: String,
    pub amount_minor: i64,
    /// `"enrollment"` or `"session"`.
    pub fulfillment_type: String,
    pub tutor_id: Option<String>,
    pub session_date: Option<DateTime<Utc>>,
    pub session_kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEnrollmentRequest {
    pub learner_id: String,
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBookingRequest {
    pub learner_id: String,
    pub tutor_id: String,
    pub course_id: String,
    pub session_date: DateTime<Utc>,
    pub duration_min: Option<u32>,
    pub session_type: Option<String>,
    pub amount_minor: Option<i64>,
    /// External payment reference; falls back to a generated one.
    pub payment_session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReviewRequest {
    pub booking_id: String,
    pub reviewer_id: String,
    pub tutor_id: String,
    pub course_id: String,
    pub rating: u8,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModerateReviewRequest {
    /// `"accepted"` or `"rejected"`.
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReviewInviteRequest {
    pub student_id: String,
    pub course_id: String,
    pub tutor_id: String,
}

// --- response shapes ---

pub fn user_to_json(user: &User) -> Value {
    json!({
        "id": user.id.to_string(),
        "name": user.name,
        "email": user.email,
        "role": user.role.as_str(),
        "created_at": user.created_at,
    })
}

pub fn tutor_to_json(tutor: &Tutor) -> Value {
    json!({
        "id": tutor.id.to_string(),
        "user_id": tutor.user_id.to_string(),
        "name": tutor.name,
        "headline": tutor.headline,
        "created_at": tutor.created_at,
    })
}

pub fn course_to_json(course: &Course) -> Value {
    json!({
        "id": course.id.to_string(),
        "tutor_id": course.tutor_id.to_string(),
        "title": course.title,
        "description": course.description,
        "price_minor": course.price.minor(),
        "session_rate_minor": course.session_rate.minor(),
        "created_at": course.created_at,
    })
}

pub fn enrollment_to_json(enrollment: &Enrollment) -> Value {
    json!({
        "id": enrollment.id.to_string(),
        "learner_id": enrollment.learner_id.to_string(),
        "course_id": enrollment.course_id.to_string(),
        "completed_lessons": enrollment.completed_lessons,
        "progress_percent": enrollment.progress_percent,
        "enrolled_at": enrollment.enrolled_at,
    })
}

pub fn booking_to_json(booking: &Booking, payment: &Payment) -> Value {
    json!({
        "id": booking.id.to_string(),
        "learner_id": booking.learner_id.to_string(),
        "tutor_id": booking.tutor_id.to_string(),
        "course_id": booking.course_id.to_string(),
        "session_date": booking.scheduled_at,
        "duration_min": booking.duration_min,
        "status": booking.status.as_str(),
        "session_type": booking.kind.as_str(),
        "created_at": booking.created_at,
        "payment": {
            "id": payment.id.to_string(),
            "amount_minor": payment.amount.minor(),
            "method": payment.method,
            "status": payment.status.as_str(),
            "transaction_ref": payment.transaction_ref,
            "paid_at": payment.paid_at,
        },
    })
}

pub fn review_to_json(review: &Review) -> Value {
    json!({
        "id": review.id.to_string(),
        "booking_id": review.booking_id.to_string(),
        "reviewer_id": review.reviewer_id.to_string(),
        "tutor_id": review.tutor_id.to_string(),
        "course_id": review.course_id.to_string(),
        "rating": review.rating,
        "comment": review.comment,
        "status": review.status.as_str(),
        "approved_at": review.approved_at,
        "created_at": review.created_at,
    })
}

pub fn review_request_to_json(request: &ReviewRequest) -> Value {
    json!({
        "id": request.id.to_string(),
        "student_id": request.student_id.to_string(),
        "course_id": request.course_id.to_string(),
        "tutor_id": request.tutor_id.to_string(),
        "created_at": request.created_at,
    })
}

pub fn redirect_to_json(redirect: &CheckoutRedirect) -> Value {
    json!({
        "session_id": redirect.session_id,
        "url": redirect.url,
    })
}

pub fn intent_to_json(intent: &PurchaseIntent) -> Value {
    let mut body = json!({
        "payer_id": intent.payer_id.to_string(),
        "course_id": intent.course_id.to_string(),
        "amount_minor": intent.amount.minor(),
    });
    match intent.fulfillment {
        Fulfillment::Enrollment => {
            body["fulfillment_type"] = json!("enrollment");
        }
        Fulfillment::Session {
            tutor_id,
            scheduled_at,
            kind,
        } => {
            body["fulfillment_type"] = json!("session");
            body["tutor_id"] = json!(tutor_id.to_string());
            body["session_date"] = json!(scheduled_at);
            body["session_kind"] = json!(kind.as_str());
        }
    }
    body
}

pub fn outcome_to_json(outcome: &FulfillmentOutcome) -> Value {
    match outcome {
        FulfillmentOutcome::Enrolled(enrollment) => json!({
            "fulfillment_type": "enrollment",
            "enrollment": enrollment_to_json(enrollment),
        }),
        FulfillmentOutcome::Booked(booking, payment) => json!({
            "fulfillment_type": "session",
            "booking": booking_to_json(booking, payment),
        }),
    }
}
