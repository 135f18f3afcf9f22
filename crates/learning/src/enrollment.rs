use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tutorhub_core::{CourseId, EnrollmentId, UserId};

/// A learner's standing membership in a course.
///
/// At most one enrollment exists per (learner, course) pair; the store
/// enforces the uniqueness and fulfillment is an atomic create-or-fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub learner_id: UserId,
    pub course_id: CourseId,
    pub completed_lessons: u32,
    pub progress_percent: u8,
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    /// Start a fresh enrollment with zeroed progress counters.
    pub fn start(id: EnrollmentId, learner_id: UserId, course_id: CourseId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            learner_id,
            course_id,
            completed_lessons: 0,
            progress_percent: 0,
            enrolled_at: now,
        }
    }

    /// Record one completed lesson out of `total_lessons`.
    pub fn record_completed_lesson(&mut self, total_lessons: u32) {
        self.completed_lessons += 1;
        if total_lessons > 0 {
            let pct = (u64::from(self.completed_lessons) * 100 / u64::from(total_lessons)).min(100);
            self.progress_percent = pct as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_zeroed_progress() {
        let e = Enrollment::start(EnrollmentId::new(), UserId::new(), CourseId::new(), Utc::now());
        assert_eq!(e.completed_lessons, 0);
        assert_eq!(e.progress_percent, 0);
    }

    #[test]
    fn progress_is_capped_at_100() {
        let mut e =
            Enrollment::start(EnrollmentId::new(), UserId::new(), CourseId::new(), Utc::now());
        for _ in 0..12 {
            e.record_completed_lesson(10);
        }
        assert_eq!(e.completed_lessons, 12);
        assert_eq!(e.progress_percent, 100);
    }
}
