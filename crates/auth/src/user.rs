//! User account model with capability roles.

use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use tutorhub_core::{DomainError, DomainResult, UserId};

use crate::Role;

/// Capability class of a user account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Learner,
    Tutor,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Learner => "learner",
            UserRole::Tutor => "tutor",
            UserRole::Admin => "admin",
        }
    }

    /// The token role corresponding to this capability class.
    pub fn as_role(&self) -> Role {
        Role::new(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "learner" => Ok(UserRole::Learner),
            "tutor" => Ok(UserRole::Tutor),
            "admin" => Ok(UserRole::Admin),
            other => Err(DomainError::validation(format!(
                "role must be one of learner, tutor, admin; got '{other}'"
            ))),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Register a new account.
    pub fn register(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let email = email.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation("email must contain '@'"));
        }
        Ok(Self {
            id,
            name,
            email,
            role,
            created_at: now,
        })
    }

    /// Whether this account belongs to the learner capability class.
    pub fn is_learner(&self) -> bool {
        self.role == UserRole::Learner
    }
}
