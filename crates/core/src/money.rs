//! Monetary amounts in the smallest currency unit (e.g. cents).

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Amount in minor units. Always strictly positive once constructed via
/// [`Amount::positive`]; raw construction is reserved for rehydration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Validate a declared amount: must be > 0.
    pub fn positive(minor: i64) -> DomainResult<Self> {
        if minor <= 0 {
            return Err(DomainError::validation(format!(
                "amount must be positive, got {minor}"
            )));
        }
        Ok(Self(minor))
    }

    /// Rehydrate a stored amount without re-validating.
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_negative() {
        assert!(Amount::positive(0).is_err());
        assert!(Amount::positive(-500).is_err());
    }

    #[test]
    fn accepts_positive() {
        assert_eq!(Amount::positive(5000).unwrap().minor(), 5000);
    }
}
