use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use tutorhub_core::{BookingId, CourseId, DomainError, DomainResult, ReviewId, TutorId, UserId};

/// Review moderation state. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Accepted => "accepted",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "accepted" => Ok(ReviewStatus::Accepted),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(DomainError::validation(format!(
                "review status must be one of pending, accepted, rejected; got '{other}'"
            ))),
        }
    }
}

/// A student's review of a tutor for a course, gated by tutor moderation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub booking_id: BookingId,
    pub reviewer_id: UserId,
    pub tutor_id: TutorId,
    pub course_id: CourseId,
    pub rating: u8,
    pub comment: Option<String>,
    pub status: ReviewStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Submit a new review in `pending` state.
    pub fn submit(
        id: ReviewId,
        booking_id: BookingId,
        reviewer_id: UserId,
        tutor_id: TutorId,
        course_id: CourseId,
        rating: u8,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !(1..=5).contains(&rating) {
            return Err(DomainError::validation(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
        Ok(Self {
            id,
            booking_id,
            reviewer_id,
            tutor_id,
            course_id,
            rating,
            comment,
            status: ReviewStatus::Pending,
            approved_at: None,
            created_at: now,
        })
    }

    fn guard_transition(&self, acting_tutor: TutorId) -> DomainResult<()> {
        if acting_tutor != self.tutor_id {
            return Err(DomainError::forbidden(
                "only the reviewed tutor may moderate this review",
            ));
        }
        if self.status != ReviewStatus::Pending {
            return Err(DomainError::conflict(format!(
                "review already {}",
                self.status.as_str()
            )));
        }
        Ok(())
    }

    /// `pending → accepted`; stamps the approval timestamp.
    pub fn accept(&mut self, acting_tutor: TutorId, now: DateTime<Utc>) -> DomainResult<()> {
        self.guard_transition(acting_tutor)?;
        self.status = ReviewStatus::Accepted;
        self.approved_at = Some(now);
        Ok(())
    }

    /// `pending → rejected`; clears the approval timestamp.
    pub fn reject(&mut self, acting_tutor: TutorId) -> DomainResult<()> {
        self.guard_transition(acting_tutor)?;
        self.status = ReviewStatus::Rejected;
        self.approved_at = None;
        Ok(())
    }
}
