use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tutorhub_core::{Amount, CourseId, DomainError, DomainResult, TutorId};

/// A course offered by a tutor.
///
/// Carries two prices: the full enrollment price and the rate for a single
/// booked session (used as the fallback amount when a booking omits one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub tutor_id: TutorId,
    pub title: String,
    pub description: String,
    pub price: Amount,
    pub session_rate: Amount,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn publish(
        id: CourseId,
        tutor_id: TutorId,
        title: impl Into<String>,
        description: impl Into<String>,
        price: Amount,
        session_rate: Amount,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation("course title must not be empty"));
        }
        Ok(Self {
            id,
            tutor_id,
            title,
            description: description.into(),
            price,
            session_rate,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_with_valid_title() {
        let c = Course::publish(
            CourseId::new(),
            TutorId::new(),
            "Algebra I",
            "Linear equations and inequalities",
            Amount::positive(5000).unwrap(),
            Amount::positive(2500).unwrap(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(c.title, "Algebra I");
    }

    #[test]
    fn rejects_blank_title() {
        let err = Course::publish(
            CourseId::new(),
            TutorId::new(),
            "   ",
            "",
            Amount::positive(5000).unwrap(),
            Amount::positive(2500).unwrap(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
