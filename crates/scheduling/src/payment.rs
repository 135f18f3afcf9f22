use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use tutorhub_core::{Amount, BookingId, DomainError, PaymentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(DomainError::validation(format!(
                "payment status must be one of pending, completed, refunded; got '{other}'"
            ))),
        }
    }
}

/// Ledger entry recording what was paid for a booking.
///
/// Owned by exactly one booking (1:1). The external transaction reference is
/// the provider's checkout session id when fulfillment came through the
/// hosted flow, or a generated fallback otherwise; it is unique in the store
/// and doubles as the duplicate-submission guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub booking_id: BookingId,
    pub amount: Amount,
    pub method: String,
    pub status: PaymentStatus,
    pub transaction_ref: String,
    pub paid_at: DateTime<Utc>,
}

impl Payment {
    /// Record a completed payment for a booking.
    pub fn completed(
        id: PaymentId,
        booking_id: BookingId,
        amount: Amount,
        method: impl Into<String>,
        transaction_ref: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            booking_id,
            amount,
            method: method.into(),
            status: PaymentStatus::Completed,
            transaction_ref: transaction_ref.into(),
            paid_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_completed_payment() {
        let booking_id = BookingId::new();
        let p = Payment::completed(
            PaymentId::new(),
            booking_id,
            Amount::positive(2500).unwrap(),
            "stripe",
            "cs_test_123",
            Utc::now(),
        );
        assert_eq!(p.booking_id, booking_id);
        assert_eq!(p.status, PaymentStatus::Completed);
        assert_eq!(p.amount.minor(), 2500);
    }
}
