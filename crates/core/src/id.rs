//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $t:ident, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier (UUIDv7, time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::validation(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id!(
    /// Identifier of a user account (learner, tutor owner, or admin).
    UserId,
    "UserId"
);
uuid_id!(
    /// Identifier of a tutor profile.
    TutorId,
    "TutorId"
);
uuid_id!(
    /// Identifier of a course.
    CourseId,
    "CourseId"
);
uuid_id!(
    /// Identifier of a learner's enrollment in a course.
    EnrollmentId,
    "EnrollmentId"
);
uuid_id!(
    /// Identifier of a scheduled session booking.
    BookingId,
    "BookingId"
);
uuid_id!(
    /// Identifier of a payment ledger entry.
    PaymentId,
    "PaymentId"
);
uuid_id!(
    /// Identifier of a review.
    ReviewId,
    "ReviewId"
);
uuid_id!(
    /// Identifier of a review invitation.
    ReviewRequestId,
    "ReviewRequestId"
);
