use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tutorhub_core::{DomainError, DomainResult, TutorId, UserId};

/// A tutor profile, owned by exactly one user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tutor {
    pub id: TutorId,
    pub user_id: UserId,
    pub name: String,
    pub headline: String,
    pub created_at: DateTime<Utc>,
}

impl Tutor {
    pub fn create(
        id: TutorId,
        user_id: UserId,
        name: impl Into<String>,
        headline: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("tutor name must not be empty"));
        }
        Ok(Self {
            id,
            user_id,
            name,
            headline: headline.into(),
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_profile() {
        let t = Tutor::create(TutorId::new(), UserId::new(), "Grace", "Math tutor", Utc::now())
            .unwrap();
        assert_eq!(t.name, "Grace");
    }

    #[test]
    fn rejects_blank_name() {
        assert!(Tutor::create(TutorId::new(), UserId::new(), "", "", Utc::now()).is_err());
    }
}
