//! Postgres-backed store via `sqlx`.
//!
//! Schema: see `schema.sql` next to this crate. The two invariants the
//! schema carries for us:
//! - `enrollments` has a unique index on (learner_id, course_id), so
//!   `enroll_or_get` is `INSERT ... ON CONFLICT DO NOTHING` plus a select;
//! - `payments.transaction_ref` is unique and `create_booking_with_payment`
//!   runs both inserts inside one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use tutorhub_auth::{User, UserRole};
use tutorhub_catalog::{Course, Tutor};
use tutorhub_core::{Amount, BookingId, CourseId, ReviewId, TutorId, UserId};
use tutorhub_learning::Enrollment;
use tutorhub_reviews::{Review, ReviewRequest, ReviewStatus};
use tutorhub_scheduling::{Booking, BookingStatus, Payment, PaymentStatus, SessionKind};

use super::{MarketplaceStore, StoreError, StoreResult};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const UNIQUE_VIOLATION: &str = "23505";

fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    StoreError::Backend(err.to_string())
}

fn parse_field<T, E: std::fmt::Display>(value: Result<T, E>, what: &str) -> StoreResult<T> {
    value.map_err(|e| StoreError::Backend(format!("bad stored {what}: {e}")))
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: String = row.try_get("role").map_err(map_sqlx)?;
    Ok(User {
        id: UserId::from(row.try_get::<Uuid, _>("id").map_err(map_sqlx)?),
        name: row.try_get("name").map_err(map_sqlx)?,
        email: row.try_get("email").map_err(map_sqlx)?,
        role: parse_field(role.parse::<UserRole>(), "user role")?,
        created_at: row.try_get("created_at").map_err(map_sqlx)?,
    })
}

fn tutor_from_row(row: &PgRow) -> StoreResult<Tutor> {
    Ok(Tutor {
        id: TutorId::from(row.try_get::<Uuid, _>("id").map_err(map_sqlx)?),
        user_id: UserId::from(row.try_get::<Uuid, _>("user_id").map_err(map_sqlx)?),
        name: row.try_get("name").map_err(map_sqlx)?,
        headline: row.try_get("headline").map_err(map_sqlx)?,
        created_at: row.try_get("created_at").map_err(map_sqlx)?,
    })
}

fn course_from_row(row: &PgRow) -> StoreResult<Course> {
    Ok(Course {
        id: CourseId::from(row.try_get::<Uuid, _>("id").map_err(map_sqlx)?),
        tutor_id: TutorId::from(row.try_get::<Uuid, _>("tutor_id").map_err(map_sqlx)?),
        title: row.try_get("title").map_err(map_sqlx)?,
        description: row.try_get("description").map_err(map_sqlx)?,
        price: Amount::from_minor(row.try_get("price_minor").map_err(map_sqlx)?),
        session_rate: Amount::from_minor(row.try_get("session_rate_minor").map_err(map_sqlx)?),
        created_at: row.try_get("created_at").map_err(map_sqlx)?,
    })
}

fn enrollment_from_row(row: &PgRow) -> StoreResult<Enrollment> {
    Ok(Enrollment {
        id: row.try_get::<Uuid, _>("id").map_err(map_sqlx)?.into(),
        learner_id: UserId::from(row.try_get::<Uuid, _>("learner_id").map_err(map_sqlx)?),
        course_id: CourseId::from(row.try_get::<Uuid, _>("course_id").map_err(map_sqlx)?),
        completed_lessons: row.try_get::<i32, _>("completed_lessons").map_err(map_sqlx)? as u32,
        progress_percent: row.try_get::<i16, _>("progress_percent").map_err(map_sqlx)? as u8,
        enrolled_at: row.try_get("enrolled_at").map_err(map_sqlx)?,
    })
}

fn booking_from_row(row: &PgRow) -> StoreResult<Booking> {
    let status: String = row.try_get("status").map_err(map_sqlx)?;
    let kind: String = row.try_get("kind").map_err(map_sqlx)?;
    Ok(Booking {
        id: BookingId::from(row.try_get::<Uuid, _>("id").map_err(map_sqlx)?),
        learner_id: UserId::from(row.try_get::<Uuid, _>("learner_id").map_err(map_sqlx)?),
        tutor_id: TutorId::from(row.try_get::<Uuid, _>("tutor_id").map_err(map_sqlx)?),
        course_id: CourseId::from(row.try_get::<Uuid, _>("course_id").map_err(map_sqlx)?),
        scheduled_at: row.try_get("scheduled_at").map_err(map_sqlx)?,
        duration_min: row.try_get::<i32, _>("duration_min").map_err(map_sqlx)? as u32,
        status: parse_field(status.parse::<BookingStatus>(), "booking status")?,
        kind: parse_field(kind.parse::<SessionKind>(), "session kind")?,
        created_at: row.try_get("created_at").map_err(map_sqlx)?,
    })
}

fn payment_from_row(row: &PgRow) -> StoreResult<Payment> {
    let status: String = row.try_get("payment_status").map_err(map_sqlx)?;
    Ok(Payment {
        id: row.try_get::<Uuid, _>("payment_id").map_err(map_sqlx)?.into(),
        booking_id: BookingId::from(row.try_get::<Uuid, _>("id").map_err(map_sqlx)?),
        amount: Amount::from_minor(row.try_get("amount_minor").map_err(map_sqlx)?),
        method: row.try_get("method").map_err(map_sqlx)?,
        status: parse_field(status.parse::<PaymentStatus>(), "payment status")?,
        transaction_ref: row.try_get("transaction_ref").map_err(map_sqlx)?,
        paid_at: row.try_get("paid_at").map_err(map_sqlx)?,
    })
}

fn review_from_row(row: &PgRow) -> StoreResult<Review> {
    let status: String = row.try_get("status").map_err(map_sqlx)?;
    Ok(Review {
        id: ReviewId::from(row.try_get::<Uuid, _>("id").map_err(map_sqlx)?),
        booking_id: BookingId::from(row.try_get::<Uuid, _>("booking_id").map_err(map_sqlx)?),
        reviewer_id: UserId::from(row.try_get::<Uuid, _>("reviewer_id").map_err(map_sqlx)?),
        tutor_id: TutorId::from(row.try_get::<Uuid, _>("tutor_id").map_err(map_sqlx)?),
        course_id: CourseId::from(row.try_get::<Uuid, _>("course_id").map_err(map_sqlx)?),
        rating: row.try_get::<i16, _>("rating").map_err(map_sqlx)? as u8,
        comment: row.try_get("comment").map_err(map_sqlx)?,
        status: parse_field(status.parse::<ReviewStatus>(), "review status")?,
        approved_at: row
            .try_get::<Option<DateTime<Utc>>, _>("approved_at")
            .map_err(map_sqlx)?,
        created_at: row.try_get("created_at").map_err(map_sqlx)?,
    })
}

fn request_from_row(row: &PgRow) -> StoreResult<ReviewRequest> {
    Ok(ReviewRequest {
        id: row.try_get::<Uuid, _>("id").map_err(map_sqlx)?.into(),
        student_id: UserId::from(row.try_get::<Uuid, _>("student_id").map_err(map_sqlx)?),
        course_id: CourseId::from(row.try_get::<Uuid, _>("course_id").map_err(map_sqlx)?),
        tutor_id: TutorId::from(row.try_get::<Uuid, _>("tutor_id").map_err(map_sqlx)?),
        created_at: row.try_get("created_at").map_err(map_sqlx)?,
    })
}

const BOOKING_JOIN: &str = "SELECT b.id, b.learner_id, b.tutor_id, b.course_id, b.scheduled_at, \
     b.duration_min, b.status, b.kind, b.created_at, \
     p.id AS payment_id, p.amount_minor, p.method, p.status AS payment_status, \
     p.transaction_ref, p.paid_at \
     FROM bookings b JOIN payments p ON p.booking_id = b.id";

fn joined_booking(row: &PgRow) -> StoreResult<(Booking, Payment)> {
    Ok((booking_from_row(row)?, payment_from_row(row)?))
}

#[async_trait]
impl MarketplaceStore for PostgresStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT id, name, email, role, created_at FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_tutor(&self, tutor: Tutor) -> StoreResult<Tutor> {
        sqlx::query(
            "INSERT INTO tutors (id, user_id, name, headline, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(tutor.id.as_uuid())
        .bind(tutor.user_id.as_uuid())
        .bind(&tutor.name)
        .bind(&tutor.headline)
        .bind(tutor.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(tutor)
    }

    async fn tutor(&self, id: TutorId) -> StoreResult<Option<Tutor>> {
        let row =
            sqlx::query("SELECT id, user_id, name, headline, created_at FROM tutors WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
        row.as_ref().map(tutor_from_row).transpose()
    }

    async fn tutor_for_user(&self, user_id: UserId) -> StoreResult<Option<Tutor>> {
        let row = sqlx::query(
            "SELECT id, user_id, name, headline, created_at FROM tutors WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.as_ref().map(tutor_from_row).transpose()
    }

    async fn tutors(&self) -> StoreResult<Vec<Tutor>> {
        let rows = sqlx::query("SELECT id, user_id, name, headline, created_at FROM tutors")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(tutor_from_row).collect()
    }

    async fn insert_course(&self, course: Course) -> StoreResult<Course> {
        sqlx::query(
            "INSERT INTO courses (id, tutor_id, title, description, price_minor, session_rate_minor, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(course.id.as_uuid())
        .bind(course.tutor_id.as_uuid())
        .bind(&course.title)
        .bind(&course.description)
        .bind(course.price.minor())
        .bind(course.session_rate.minor())
        .bind(course.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(course)
    }

    async fn course(&self, id: CourseId) -> StoreResult<Option<Course>> {
        let row = sqlx::query(
            "SELECT id, tutor_id, title, description, price_minor, session_rate_minor, created_at \
             FROM courses WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn courses(&self) -> StoreResult<Vec<Course>> {
        let rows = sqlx::query(
            "SELECT id, tutor_id, title, description, price_minor, session_rate_minor, created_at \
             FROM courses",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.iter().map(course_from_row).collect()
    }

    async fn enrollment_for(
        &self,
        learner_id: UserId,
        course_id: CourseId,
    ) -> StoreResult<Option<Enrollment>> {
        let row = sqlx::query(
            "SELECT id, learner_id, course_id, completed_lessons, progress_percent, enrolled_at \
             FROM enrollments WHERE learner_id = $1 AND course_id = $2",
        )
        .bind(learner_id.as_uuid())
        .bind(course_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.as_ref().map(enrollment_from_row).transpose()
    }

    async fn enroll_or_get(&self, candidate: Enrollment) -> StoreResult<(Enrollment, bool)> {
        // Atomic create-or-fetch on the (learner_id, course_id) unique index.
        let inserted = sqlx::query(
            "INSERT INTO enrollments (id, learner_id, course_id, completed_lessons, progress_percent, enrolled_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (learner_id, course_id) DO NOTHING \
             RETURNING id, learner_id, course_id, completed_lessons, progress_percent, enrolled_at",
        )
        .bind(candidate.id.as_uuid())
        .bind(candidate.learner_id.as_uuid())
        .bind(candidate.course_id.as_uuid())
        .bind(candidate.completed_lessons as i32)
        .bind(candidate.progress_percent as i16)
        .bind(candidate.enrolled_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if let Some(row) = inserted {
            return Ok((enrollment_from_row(&row)?, true));
        }
        let existing = self
            .enrollment_for(candidate.learner_id, candidate.course_id)
            .await?
            .ok_or_else(|| StoreError::Backend("enrollment vanished after upsert".to_string()))?;
        Ok((existing, false))
    }

    async fn enrollments_for(&self, learner_id: UserId) -> StoreResult<Vec<Enrollment>> {
        let rows = sqlx::query(
            "SELECT id, learner_id, course_id, completed_lessons, progress_percent, enrolled_at \
             FROM enrollments WHERE learner_id = $1",
        )
        .bind(learner_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.iter().map(enrollment_from_row).collect()
    }

    async fn create_booking_with_payment(
        &self,
        booking: Booking,
        payment: Payment,
    ) -> StoreResult<(Booking, Payment)> {
        // All-or-nothing: a booking must never exist without its payment.
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        sqlx::query(
            "INSERT INTO bookings (id, learner_id, tutor_id, course_id, scheduled_at, duration_min, status, kind, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.learner_id.as_uuid())
        .bind(booking.tutor_id.as_uuid())
        .bind(booking.course_id.as_uuid())
        .bind(booking.scheduled_at)
        .bind(booking.duration_min as i32)
        .bind(booking.status.as_str())
        .bind(booking.kind.as_str())
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        sqlx::query(
            "INSERT INTO payments (id, booking_id, amount_minor, method, status, transaction_ref, paid_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(payment.id.as_uuid())
        .bind(payment.booking_id.as_uuid())
        .bind(payment.amount.minor())
        .bind(&payment.method)
        .bind(payment.status.as_str())
        .bind(&payment.transaction_ref)
        .bind(payment.paid_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok((booking, payment))
    }

    async fn booking(&self, id: BookingId) -> StoreResult<Option<(Booking, Payment)>> {
        let row = sqlx::query(&format!("{BOOKING_JOIN} WHERE b.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(joined_booking).transpose()
    }

    async fn booking_by_reference(
        &self,
        transaction_ref: &str,
    ) -> StoreResult<Option<(Booking, Payment)>> {
        let row = sqlx::query(&format!("{BOOKING_JOIN} WHERE p.transaction_ref = $1"))
            .bind(transaction_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(joined_booking).transpose()
    }

    async fn bookings_for(&self, learner_id: UserId) -> StoreResult<Vec<(Booking, Payment)>> {
        let rows = sqlx::query(&format!("{BOOKING_JOIN} WHERE b.learner_id = $1"))
            .bind(learner_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(joined_booking).collect()
    }

    async fn insert_review(&self, review: Review) -> StoreResult<Review> {
        sqlx::query(
            "INSERT INTO reviews (id, booking_id, reviewer_id, tutor_id, course_id, rating, comment, status, approved_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(review.id.as_uuid())
        .bind(review.booking_id.as_uuid())
        .bind(review.reviewer_id.as_uuid())
        .bind(review.tutor_id.as_uuid())
        .bind(review.course_id.as_uuid())
        .bind(review.rating as i16)
        .bind(&review.comment)
        .bind(review.status.as_str())
        .bind(review.approved_at)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(review)
    }

    async fn review(&self, id: ReviewId) -> StoreResult<Option<Review>> {
        let row = sqlx::query(
            "SELECT id, booking_id, reviewer_id, tutor_id, course_id, rating, comment, status, approved_at, created_at \
             FROM reviews WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.as_ref().map(review_from_row).transpose()
    }

    async fn update_review(&self, review: Review) -> StoreResult<Review> {
        let result = sqlx::query(
            "UPDATE reviews SET status = $2, approved_at = $3 WHERE id = $1",
        )
        .bind(review.id.as_uuid())
        .bind(review.status.as_str())
        .bind(review.approved_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("review {}", review.id)));
        }
        Ok(review)
    }

    async fn delete_review(&self, id: ReviewId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("review {id}")));
        }
        Ok(())
    }

    async fn reviews_for_tutor(&self, tutor_id: TutorId) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query(
            "SELECT id, booking_id, reviewer_id, tutor_id, course_id, rating, comment, status, approved_at, created_at \
             FROM reviews WHERE tutor_id = $1",
        )
        .bind(tutor_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.iter().map(review_from_row).collect()
    }

    async fn review_exists(
        &self,
        reviewer_id: UserId,
        course_id: CourseId,
        tutor_id: TutorId,
    ) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE reviewer_id = $1 AND course_id = $2 AND tutor_id = $3) AS present",
        )
        .bind(reviewer_id.as_uuid())
        .bind(course_id.as_uuid())
        .bind(tutor_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.try_get("present").map_err(map_sqlx)
    }

    async fn insert_review_request(&self, request: ReviewRequest) -> StoreResult<ReviewRequest> {
        sqlx::query(
            "INSERT INTO review_requests (id, student_id, course_id, tutor_id, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(request.id.as_uuid())
        .bind(request.student_id.as_uuid())
        .bind(request.course_id.as_uuid())
        .bind(request.tutor_id.as_uuid())
        .bind(request.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(request)
    }

    async fn review_requests_for(&self, student_id: UserId) -> StoreResult<Vec<ReviewRequest>> {
        let rows = sqlx::query(
            "SELECT id, student_id, course_id, tutor_id, created_at \
             FROM review_requests WHERE student_id = $1",
        )
        .bind(student_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.iter().map(request_from_row).collect()
    }
}
