//! `tutorhub-reviews` — review moderation and review invitations.

pub mod request;
pub mod review;

pub use request::ReviewRequest;
pub use review::{Review, ReviewStatus};
