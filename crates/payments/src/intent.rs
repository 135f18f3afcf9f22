//! Purchase intent, encoded as flat provider-side session metadata.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tutorhub_core::{Amount, CourseId, DomainError, DomainResult, TutorId, UserId};
use tutorhub_scheduling::SessionKind;

const KEY_FULFILLMENT: &str = "fulfillment_type";
const KEY_COURSE: &str = "course_id";
const KEY_PAYER: &str = "user_id";
const KEY_AMOUNT: &str = "amount_minor";
const KEY_TUTOR: &str = "tutor_id";
const KEY_SESSION_DATE: &str = "session_date";
const KEY_SESSION_KIND: &str = "session_kind";

/// What the payment buys once it completes.
///
/// The session date/kind/tutor exist only on the `Session` variant, so the
/// "session date required iff booking a session" invariant holds by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Fulfillment {
    Enrollment,
    Session {
        tutor_id: TutorId,
        scheduled_at: DateTime<Utc>,
        kind: SessionKind,
    },
}

impl Fulfillment {
    fn type_str(&self) -> &'static str {
        match self {
            Fulfillment::Enrollment => "enrollment",
            Fulfillment::Session { .. } => "session",
        }
    }
}

/// Ephemeral purchase description. Held only in provider-side session
/// metadata, read exactly once at fulfillment, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseIntent {
    pub payer_id: UserId,
    pub course_id: CourseId,
    pub amount: Amount,
    pub fulfillment: Fulfillment,
}

impl PurchaseIntent {
    /// Encode as the flat string map hosted-checkout providers accept.
    pub fn to_metadata(&self) -> HashMap<String, String> {
        let mut meta = HashMap::new();
        meta.insert(KEY_FULFILLMENT.into(), self.fulfillment.type_str().into());
        meta.insert(KEY_COURSE.into(), self.course_id.to_string());
        meta.insert(KEY_PAYER.into(), self.payer_id.to_string());
        meta.insert(KEY_AMOUNT.into(), self.amount.minor().to_string());
        if let Fulfillment::Session {
            tutor_id,
            scheduled_at,
            kind,
        } = &self.fulfillment
        {
            meta.insert(KEY_TUTOR.into(), tutor_id.to_string());
            meta.insert(KEY_SESSION_DATE.into(), scheduled_at.to_rfc3339());
            meta.insert(KEY_SESSION_KIND.into(), kind.as_str().into());
        }
        meta
    }

    /// Decode session metadata back into an intent, rejecting malformed or
    /// incomplete shapes before any side effect happens.
    pub fn from_metadata(meta: &HashMap<String, String>) -> DomainResult<Self> {
        let field = |key: &str| {
            meta.get(key)
                .ok_or_else(|| DomainError::validation(format!("metadata missing '{key}'")))
        };

        let payer_id: UserId = field(KEY_PAYER)?.parse()?;
        let course_id: CourseId = field(KEY_COURSE)?.parse()?;
        let amount_minor: i64 = field(KEY_AMOUNT)?
            .parse()
            .map_err(|_| DomainError::validation("metadata amount is not an integer"))?;
        let amount = Amount::positive(amount_minor)?;

        let fulfillment = match field(KEY_FULFILLMENT)?.as_str() {
            "enrollment" => Fulfillment::Enrollment,
            "session" => {
                let tutor_id: TutorId = field(KEY_TUTOR)?.parse()?;
                let scheduled_at = DateTime::parse_from_rfc3339(field(KEY_SESSION_DATE)?)
                    .map_err(|e| {
                        DomainError::validation(format!("metadata session date: {e}"))
                    })?
                    .with_timezone(&Utc);
                let kind: SessionKind = field(KEY_SESSION_KIND)?.parse()?;
                Fulfillment::Session {
                    tutor_id,
                    scheduled_at,
                    kind,
                }
            }
            other => {
                return Err(DomainError::validation(format!(
                    "unknown fulfillment type '{other}'"
                )));
            }
        };

        Ok(Self {
            payer_id,
            course_id,
            amount,
            fulfillment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn enrollment_intent(amount: i64) -> PurchaseIntent {
        PurchaseIntent {
            payer_id: UserId::new(),
            course_id: CourseId::new(),
            amount: Amount::positive(amount).unwrap(),
            fulfillment: Fulfillment::Enrollment,
        }
    }

    #[test]
    fn enrollment_round_trips_through_metadata() {
        let intent = enrollment_intent(5000);
        let decoded = PurchaseIntent::from_metadata(&intent.to_metadata()).unwrap();
        assert_eq!(decoded, intent);
    }

    #[test]
    fn session_round_trips_through_metadata() {
        let intent = PurchaseIntent {
            payer_id: UserId::new(),
            course_id: CourseId::new(),
            amount: Amount::positive(2500).unwrap(),
            fulfillment: Fulfillment::Session {
                tutor_id: TutorId::new(),
                scheduled_at: "2025-01-10T18:00:00Z".parse().unwrap(),
                kind: SessionKind::Individual,
            },
        };
        let decoded = PurchaseIntent::from_metadata(&intent.to_metadata()).unwrap();
        assert_eq!(decoded, intent);
    }

    #[test]
    fn session_without_date_is_rejected() {
        let intent = PurchaseIntent {
            payer_id: UserId::new(),
            course_id: CourseId::new(),
            amount: Amount::positive(2500).unwrap(),
            fulfillment: Fulfillment::Session {
                tutor_id: TutorId::new(),
                scheduled_at: Utc::now(),
                kind: SessionKind::Group,
            },
        };
        let mut meta = intent.to_metadata();
        meta.remove("session_date");
        let err = PurchaseIntent::from_metadata(&meta).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn unknown_fulfillment_type_is_rejected() {
        let mut meta = enrollment_intent(100).to_metadata();
        meta.insert("fulfillment_type".into(), "subscription".into());
        assert!(PurchaseIntent::from_metadata(&meta).is_err());
    }

    proptest! {
        #[test]
        fn any_positive_amount_survives_the_codec(amount in 1i64..=10_000_000) {
            let intent = enrollment_intent(amount);
            let decoded = PurchaseIntent::from_metadata(&intent.to_metadata()).unwrap();
            prop_assert_eq!(decoded.amount.minor(), amount);
        }

        #[test]
        fn non_positive_amounts_never_decode(amount in -10_000i64..=0) {
            let mut meta = enrollment_intent(1).to_metadata();
            meta.insert("amount_minor".into(), amount.to_string());
            prop_assert!(PurchaseIntent::from_metadata(&meta).is_err());
        }
    }
}
