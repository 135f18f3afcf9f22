pub mod bookings;
pub mod checkout;
pub mod courses;
pub mod enrollments;
pub mod reviews;
pub mod system;
pub mod tutors;
pub mod users;

use axum::Router;

/// Everything behind bearer authentication.
pub fn protected_router() -> Router {
    Router::new()
        .nest("/users", users::router())
        .nest("/tutors", tutors::router())
        .nest("/courses", courses::router())
        .nest("/checkout", checkout::router())
        .nest("/enrollments", enrollments::router())
        .nest("/bookings", bookings::router())
        .nest("/reviews", reviews::router())
        .nest("/review-requests", reviews::requests_router())
}
