//! Application wiring: routers, services, and HTTP mapping.

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    Extension, Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use tutorhub_auth::Hs256JwtValidator;

use crate::middleware::{AuthState, auth_middleware};
use services::AppServices;

/// Build the full router. Registration and the health probe are public;
/// everything else sits behind bearer authentication.
pub fn build_app(jwt_secret: &[u8], services: Arc<AppServices>) -> Router {
    let auth = AuthState {
        jwt: Arc::new(Hs256JwtValidator::new(jwt_secret.to_vec())),
    };

    let protected = routes::protected_router()
        .layer(from_fn_with_state(auth, auth_middleware))
        .layer(Extension(services.clone()));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/users", post(routes::users::register_user))
        .layer(Extension(services))
        .merge(protected)
}
