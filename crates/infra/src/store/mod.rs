//! Relational store boundary.

use async_trait::async_trait;
use thiserror::Error;

use tutorhub_auth::User;
use tutorhub_catalog::{Course, Tutor};
use tutorhub_core::{BookingId, CourseId, DomainError, ReviewId, TutorId, UserId};
use tutorhub_learning::Enrollment;
use tutorhub_reviews::{Review, ReviewRequest};
use tutorhub_scheduling::{Booking, Payment};

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Uniqueness constraint hit (duplicate key).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => DomainError::conflict(msg),
            StoreError::NotFound(what) => DomainError::not_found(what),
            StoreError::Backend(msg) => DomainError::internal(msg),
        }
    }
}

/// Transactional marketplace datastore.
///
/// Contract highlights:
/// - `enroll_or_get` is an atomic create-or-fetch against the uniqueness of
///   (learner, course) — no check-then-act race. The bool is `true` when the
///   candidate was inserted.
/// - `create_booking_with_payment` writes the booking and its payment as one
///   all-or-nothing unit and fails with [`StoreError::Conflict`] when the
///   payment's transaction reference already exists.
#[async_trait]
pub trait MarketplaceStore: Send + Sync {
    // users
    async fn insert_user(&self, user: User) -> StoreResult<User>;
    async fn user(&self, id: UserId) -> StoreResult<Option<User>>;

    // tutors
    async fn insert_tutor(&self, tutor: Tutor) -> StoreResult<Tutor>;
    async fn tutor(&self, id: TutorId) -> StoreResult<Option<Tutor>>;
    async fn tutor_for_user(&self, user_id: UserId) -> StoreResult<Option<Tutor>>;
    async fn tutors(&self) -> StoreResult<Vec<Tutor>>;

    // courses
    async fn insert_course(&self, course: Course) -> StoreResult<Course>;
    async fn course(&self, id: CourseId) -> StoreResult<Option<Course>>;
    async fn courses(&self) -> StoreResult<Vec<Course>>;

    // enrollments
    async fn enrollment_for(
        &self,
        learner_id: UserId,
        course_id: CourseId,
    ) -> StoreResult<Option<Enrollment>>;
    async fn enroll_or_get(&self, candidate: Enrollment) -> StoreResult<(Enrollment, bool)>;
    async fn enrollments_for(&self, learner_id: UserId) -> StoreResult<Vec<Enrollment>>;

    // bookings + payments
    async fn create_booking_with_payment(
        &self,
        booking: Booking,
        payment: Payment,
    ) -> StoreResult<(Booking, Payment)>;
    async fn booking(&self, id: BookingId) -> StoreResult<Option<(Booking, Payment)>>;
    async fn booking_by_reference(
        &self,
        transaction_ref: &str,
    ) -> StoreResult<Option<(Booking, Payment)>>;
    async fn bookings_for(&self, learner_id: UserId) -> StoreResult<Vec<(Booking, Payment)>>;

    // reviews
    async fn insert_review(&self, review: Review) -> StoreResult<Review>;
    async fn review(&self, id: ReviewId) -> StoreResult<Option<Review>>;
    async fn update_review(&self, review: Review) -> StoreResult<Review>;
    async fn delete_review(&self, id: ReviewId) -> StoreResult<()>;
    async fn reviews_for_tutor(&self, tutor_id: TutorId) -> StoreResult<Vec<Review>>;
    async fn review_exists(
        &self,
        reviewer_id: UserId,
        course_id: CourseId,
        tutor_id: TutorId,
    ) -> StoreResult<bool>;

    // review requests
    async fn insert_review_request(&self, request: ReviewRequest) -> StoreResult<ReviewRequest>;
    async fn review_requests_for(&self, student_id: UserId) -> StoreResult<Vec<ReviewRequest>>;
}
