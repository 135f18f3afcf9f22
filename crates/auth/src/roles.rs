use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier carried in tokens.
///
/// Roles are opaque strings at this layer; the capability classes the
/// marketplace cares about are exposed as named constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The learner capability class (may purchase and enroll).
    pub fn learner() -> Self {
        Self::new("learner")
    }

    /// The tutor capability class (owns courses and moderates reviews).
    pub fn tutor() -> Self {
        Self::new("tutor")
    }

    pub fn admin() -> Self {
        Self::new("admin")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
