//! Payment-to-fulfillment flow.
//!
//! Checkout Initiator → (external redirect) → Session Resolver →
//! Fulfillment Dispatcher → {Enrollment Fulfillment | Booking Fulfillment}.
//!
//! Nothing is written locally before the provider call succeeds; everything
//! fulfillment needs rides in the hosted session's metadata. Both
//! fulfillment operations tolerate duplicate invocation: enrollment through
//! the store's atomic create-or-fetch, booking through the unique
//! transaction reference.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use tutorhub_catalog::Course;
use tutorhub_core::{
    Amount, BookingId, CourseId, DomainError, DomainResult, EnrollmentId, PaymentId, TutorId,
    UserId,
};
use tutorhub_learning::Enrollment;
use tutorhub_payments::{
    CheckoutProvider, CreateSessionRequest, Fulfillment, PurchaseIntent,
};
use tutorhub_scheduling::{Booking, DEFAULT_DURATION_MIN, Payment, SessionKind};

use crate::store::MarketplaceStore;

/// What a completed payment session was turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum FulfillmentOutcome {
    Enrolled(Enrollment),
    Booked(Booking, Payment),
}

/// Redirect target returned by the Checkout Initiator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub session_id: String,
    pub url: String,
}

/// A validated purchase request (payer supplied separately from the
/// authenticated context).
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub course_id: CourseId,
    pub amount: Amount,
    pub fulfillment: Fulfillment,
}

/// Inputs for Booking Fulfillment; optional fields fall back to defaults.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub learner_id: UserId,
    pub tutor_id: TutorId,
    pub course_id: CourseId,
    pub scheduled_at: DateTime<Utc>,
    pub duration_min: Option<u32>,
    pub kind: Option<SessionKind>,
    /// Falls back to the course's single-session rate.
    pub amount: Option<Amount>,
    /// Falls back to a generated reference.
    pub transaction_ref: Option<String>,
}

pub struct CheckoutService {
    store: Arc<dyn MarketplaceStore>,
    provider: Arc<dyn CheckoutProvider>,
    currency: String,
    success_url: String,
    cancel_url: String,
}

impl CheckoutService {
    pub fn new(
        store: Arc<dyn MarketplaceStore>,
        provider: Arc<dyn CheckoutProvider>,
        success_url: String,
        cancel_url: String,
    ) -> Self {
        Self {
            store,
            provider,
            currency: "usd".to_string(),
            success_url,
            cancel_url,
        }
    }

    async fn require_learner(&self, user_id: UserId) -> DomainResult<()> {
        let user = self
            .store
            .user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("user {user_id}")))?;
        if !user.is_learner() {
            return Err(DomainError::forbidden("only learners may purchase"));
        }
        Ok(())
    }

    async fn require_course(&self, course_id: CourseId) -> DomainResult<Course> {
        self.store
            .course(course_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("course {course_id}")))
    }

    /// Checkout Initiator: validate the purchase and open one hosted
    /// payment session. No local state is created.
    pub async fn initiate(
        &self,
        payer_id: UserId,
        request: CheckoutRequest,
    ) -> DomainResult<CheckoutRedirect> {
        self.require_learner(payer_id).await?;
        let course = self.require_course(request.course_id).await?;

        if let Fulfillment::Enrollment = request.fulfillment {
            if self
                .store
                .enrollment_for(payer_id, request.course_id)
                .await?
                .is_some()
            {
                return Err(DomainError::conflict("already enrolled in this course"));
            }
        }

        let intent = PurchaseIntent {
            payer_id,
            course_id: request.course_id,
            amount: request.amount,
            fulfillment: request.fulfillment,
        };

        let session = self
            .provider
            .create_session(CreateSessionRequest {
                amount: request.amount,
                currency: self.currency.clone(),
                description: course.title.clone(),
                metadata: intent.to_metadata(),
                success_url: self.success_url.clone(),
                cancel_url: self.cancel_url.clone(),
            })
            .await?;

        info!(session_id = %session.id, payer = %payer_id, "opened hosted checkout session");
        Ok(CheckoutRedirect {
            session_id: session.id,
            url: session.url,
        })
    }

    /// Session Resolver: pure read of a hosted session's purchase intent.
    pub async fn resolve(&self, session_ref: &str) -> DomainResult<PurchaseIntent> {
        let session = self.provider.retrieve_session(session_ref).await?;
        PurchaseIntent::from_metadata(&session.metadata)
    }

    /// Fulfillment Dispatcher: exactly one fulfillment attempt per call.
    pub async fn fulfill(
        &self,
        acting_user: Option<UserId>,
        session_ref: &str,
    ) -> DomainResult<FulfillmentOutcome> {
        if acting_user.is_none() {
            return Err(DomainError::Unauthorized);
        }

        let intent = self.resolve(session_ref).await?;
        match intent.fulfillment {
            Fulfillment::Enrollment => {
                let enrollment = self
                    .fulfill_enrollment(intent.payer_id, intent.course_id)
                    .await?;
                Ok(FulfillmentOutcome::Enrolled(enrollment))
            }
            Fulfillment::Session {
                tutor_id,
                scheduled_at,
                kind,
            } => {
                let (booking, payment) = self
                    .fulfill_booking(BookingRequest {
                        learner_id: intent.payer_id,
                        tutor_id,
                        course_id: intent.course_id,
                        scheduled_at,
                        duration_min: None,
                        kind: Some(kind),
                        amount: Some(intent.amount),
                        transaction_ref: Some(session_ref.to_string()),
                    })
                    .await?;
                Ok(FulfillmentOutcome::Booked(booking, payment))
            }
        }
    }

    /// Enrollment Fulfillment: idempotent create-or-fetch.
    pub async fn fulfill_enrollment(
        &self,
        learner_id: UserId,
        course_id: CourseId,
    ) -> DomainResult<Enrollment> {
        self.require_learner(learner_id).await?;
        self.require_course(course_id).await?;

        let candidate = Enrollment::start(EnrollmentId::new(), learner_id, course_id, Utc::now());
        let (enrollment, created) = self.store.enroll_or_get(candidate).await?;
        if created {
            info!(learner = %learner_id, course = %course_id, "enrollment created");
        } else {
            info!(learner = %learner_id, course = %course_id, "enrollment already present");
        }
        Ok(enrollment)
    }

    /// Booking Fulfillment: one Booking plus its Payment, atomically.
    pub async fn fulfill_booking(
        &self,
        request: BookingRequest,
    ) -> DomainResult<(Booking, Payment)> {
        self.require_learner(request.learner_id).await?;
        let course = self.require_course(request.course_id).await?;
        self.store
            .tutor(request.tutor_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("tutor {}", request.tutor_id)))?;

        let amount = request.amount.unwrap_or(course.session_rate);
        let transaction_ref = request
            .transaction_ref
            .unwrap_or_else(|| format!("txn_{}", Uuid::now_v7().simple()));

        let now = Utc::now();
        let booking = Booking::confirm(
            BookingId::new(),
            request.learner_id,
            request.tutor_id,
            request.course_id,
            request.scheduled_at,
            request.duration_min.unwrap_or(DEFAULT_DURATION_MIN),
            request.kind.unwrap_or(SessionKind::Individual),
            now,
        )?;
        let payment = Payment::completed(
            PaymentId::new(),
            booking.id,
            amount,
            self.provider.name(),
            transaction_ref.clone(),
            now,
        );

        match self.store.create_booking_with_payment(booking, payment).await {
            Ok(pair) => Ok(pair),
            Err(err) => {
                // Duplicate submission of the same checkout session: hand
                // back the booking that reference already paid for.
                if let Some(existing) = self.store.booking_by_reference(&transaction_ref).await? {
                    warn!(transaction_ref, "duplicate booking fulfillment; returning existing");
                    return Ok(existing);
                }
                Err(err.into())
            }
        }
    }
}
