//! `tutorhub-scheduling` — booked sessions and their payment ledger entries.

pub mod booking;
pub mod payment;

pub use booking::{Booking, BookingStatus, DEFAULT_DURATION_MIN, SessionKind};
pub use payment::{Payment, PaymentStatus};
