use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tutorhub_core::{CourseId, ReviewRequestId, TutorId, UserId};

use crate::Review;

/// An invitation for a student to review a tutor for a course.
///
/// Requests are never mutated when the review gets written; a student's
/// pending list is computed at read time by filtering out requests that a
/// matching review already satisfies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub id: ReviewRequestId,
    pub student_id: UserId,
    pub course_id: CourseId,
    pub tutor_id: TutorId,
    pub created_at: DateTime<Utc>,
}

impl ReviewRequest {
    pub fn invite(
        id: ReviewRequestId,
        student_id: UserId,
        course_id: CourseId,
        tutor_id: TutorId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            student_id,
            course_id,
            tutor_id,
            created_at: now,
        }
    }

    /// Whether `review` satisfies this invitation: same (student, course,
    /// tutor) triple, regardless of moderation state.
    pub fn is_satisfied_by(&self, review: &Review) -> bool {
        review.reviewer_id == self.student_id
            && review.course_id == self.course_id
            && review.tutor_id == self.tutor_id
    }
}
