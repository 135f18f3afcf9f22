//! `tutorhub-learning` — enrollment domain.

pub mod enrollment;

pub use enrollment::Enrollment;
