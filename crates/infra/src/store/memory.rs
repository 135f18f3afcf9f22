//! In-memory store for dev/test.
//!
//! One mutex over the whole state: every trait method is a single critical
//! section, which is what makes `enroll_or_get` and
//! `create_booking_with_payment` atomic here.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use tutorhub_auth::User;
use tutorhub_catalog::{Course, Tutor};
use tutorhub_core::{BookingId, CourseId, EnrollmentId, ReviewId, ReviewRequestId, TutorId, UserId};
use tutorhub_learning::Enrollment;
use tutorhub_reviews::{Review, ReviewRequest};
use tutorhub_scheduling::{Booking, Payment};

use super::{MarketplaceStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    tutors: HashMap<TutorId, Tutor>,
    courses: HashMap<CourseId, Course>,
    enrollments: HashMap<EnrollmentId, Enrollment>,
    bookings: HashMap<BookingId, (Booking, Payment)>,
    reviews: HashMap<ReviewId, Review>,
    review_requests: HashMap<ReviewRequestId, ReviewRequest>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarketplaceStore for InMemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut state = self.inner.lock().unwrap();
        if state.users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user {} exists", user.id)));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn insert_tutor(&self, tutor: Tutor) -> StoreResult<Tutor> {
        let mut state = self.inner.lock().unwrap();
        if state.tutors.values().any(|t| t.user_id == tutor.user_id) {
            return Err(StoreError::Conflict(format!(
                "tutor profile for user {} exists",
                tutor.user_id
            )));
        }
        state.tutors.insert(tutor.id, tutor.clone());
        Ok(tutor)
    }

    async fn tutor(&self, id: TutorId) -> StoreResult<Option<Tutor>> {
        Ok(self.inner.lock().unwrap().tutors.get(&id).cloned())
    }

    async fn tutor_for_user(&self, user_id: UserId) -> StoreResult<Option<Tutor>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .tutors
            .values()
            .find(|t| t.user_id == user_id)
            .cloned())
    }

    async fn tutors(&self) -> StoreResult<Vec<Tutor>> {
        Ok(self.inner.lock().unwrap().tutors.values().cloned().collect())
    }

    async fn insert_course(&self, course: Course) -> StoreResult<Course> {
        let mut state = self.inner.lock().unwrap();
        state.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn course(&self, id: CourseId) -> StoreResult<Option<Course>> {
        Ok(self.inner.lock().unwrap().courses.get(&id).cloned())
    }

    async fn courses(&self) -> StoreResult<Vec<Course>> {
        Ok(self.inner.lock().unwrap().courses.values().cloned().collect())
    }

    async fn enrollment_for(
        &self,
        learner_id: UserId,
        course_id: CourseId,
    ) -> StoreResult<Option<Enrollment>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .enrollments
            .values()
            .find(|e| e.learner_id == learner_id && e.course_id == course_id)
            .cloned())
    }

    async fn enroll_or_get(&self, candidate: Enrollment) -> StoreResult<(Enrollment, bool)> {
        let mut state = self.inner.lock().unwrap();
        if let Some(existing) = state
            .enrollments
            .values()
            .find(|e| e.learner_id == candidate.learner_id && e.course_id == candidate.course_id)
        {
            return Ok((existing.clone(), false));
        }
        state.enrollments.insert(candidate.id, candidate.clone());
        Ok((candidate, true))
    }

    async fn enrollments_for(&self, learner_id: UserId) -> StoreResult<Vec<Enrollment>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .enrollments
            .values()
            .filter(|e| e.learner_id == learner_id)
            .cloned()
            .collect())
    }

    async fn create_booking_with_payment(
        &self,
        booking: Booking,
        payment: Payment,
    ) -> StoreResult<(Booking, Payment)> {
        let mut state = self.inner.lock().unwrap();
        if state
            .bookings
            .values()
            .any(|(_, p)| p.transaction_ref == payment.transaction_ref)
        {
            return Err(StoreError::Conflict(format!(
                "transaction reference {} already recorded",
                payment.transaction_ref
            )));
        }
        state
            .bookings
            .insert(booking.id, (booking.clone(), payment.clone()));
        Ok((booking, payment))
    }

    async fn booking(&self, id: BookingId) -> StoreResult<Option<(Booking, Payment)>> {
        Ok(self.inner.lock().unwrap().bookings.get(&id).cloned())
    }

    async fn booking_by_reference(
        &self,
        transaction_ref: &str,
    ) -> StoreResult<Option<(Booking, Payment)>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .bookings
            .values()
            .find(|(_, p)| p.transaction_ref == transaction_ref)
            .cloned())
    }

    async fn bookings_for(&self, learner_id: UserId) -> StoreResult<Vec<(Booking, Payment)>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .bookings
            .values()
            .filter(|(b, _)| b.learner_id == learner_id)
            .cloned()
            .collect())
    }

    async fn insert_review(&self, review: Review) -> StoreResult<Review> {
        let mut state = self.inner.lock().unwrap();
        state.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn review(&self, id: ReviewId) -> StoreResult<Option<Review>> {
        Ok(self.inner.lock().unwrap().reviews.get(&id).cloned())
    }

    async fn update_review(&self, review: Review) -> StoreResult<Review> {
        let mut state = self.inner.lock().unwrap();
        if !state.reviews.contains_key(&review.id) {
            return Err(StoreError::NotFound(format!("review {}", review.id)));
        }
        state.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn delete_review(&self, id: ReviewId) -> StoreResult<()> {
        let mut state = self.inner.lock().unwrap();
        state
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("review {id}")))
    }

    async fn reviews_for_tutor(&self, tutor_id: TutorId) -> StoreResult<Vec<Review>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .reviews
            .values()
            .filter(|r| r.tutor_id == tutor_id)
            .cloned()
            .collect())
    }

    async fn review_exists(
        &self,
        reviewer_id: UserId,
        course_id: CourseId,
        tutor_id: TutorId,
    ) -> StoreResult<bool> {
        Ok(self.inner.lock().unwrap().reviews.values().any(|r| {
            r.reviewer_id == reviewer_id && r.course_id == course_id && r.tutor_id == tutor_id
        }))
    }

    async fn insert_review_request(&self, request: ReviewRequest) -> StoreResult<ReviewRequest> {
        let mut state = self.inner.lock().unwrap();
        state.review_requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn review_requests_for(&self, student_id: UserId) -> StoreResult<Vec<ReviewRequest>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .review_requests
            .values()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }
}
