use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use tutorhub_core::{BookingId, CourseId, DomainError, DomainResult, TutorId, UserId};

/// Default length of a booked session.
pub const DEFAULT_DURATION_MIN: u32 = 60;

/// Booking status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "status must be one of confirmed, completed, cancelled; got '{other}'"
            ))),
        }
    }
}

/// Whether a booked session is individual or group format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Individual,
    Group,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Individual => "individual",
            SessionKind::Group => "group",
        }
    }
}

impl FromStr for SessionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(SessionKind::Individual),
            "group" => Ok(SessionKind::Group),
            other => Err(DomainError::validation(format!(
                "session kind must be individual or group; got '{other}'"
            ))),
        }
    }
}

/// One scheduled session between a learner and a tutor for a course.
///
/// A booking owns exactly one [`crate::Payment`] and is only ever created
/// together with it, inside a single store transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub learner_id: UserId,
    pub tutor_id: TutorId,
    pub course_id: CourseId,
    pub scheduled_at: DateTime<Utc>,
    pub duration_min: u32,
    pub status: BookingStatus,
    pub kind: SessionKind,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Schedule a confirmed session.
    pub fn confirm(
        id: BookingId,
        learner_id: UserId,
        tutor_id: TutorId,
        course_id: CourseId,
        scheduled_at: DateTime<Utc>,
        duration_min: u32,
        kind: SessionKind,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if duration_min == 0 {
            return Err(DomainError::validation("duration must be positive"));
        }
        Ok(Self {
            id,
            learner_id,
            tutor_id,
            course_id,
            scheduled_at,
            duration_min,
            status: BookingStatus::Confirmed,
            kind,
            created_at: now,
        })
    }
}
