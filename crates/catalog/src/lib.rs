//! `tutorhub-catalog` — course and tutor domain entities.

pub mod course;
pub mod tutor;

pub use course::Course;
pub use tutor::Tutor;
