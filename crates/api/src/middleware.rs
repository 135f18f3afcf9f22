use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use tutorhub_auth::JwtValidator;

use crate::app::errors::json_error;
use crate::context::AuthContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())?;

    let claims = state
        .jwt
        .validate(token, Utc::now())
        .map_err(|e| unauthorized(e.to_string()))?;

    req.extensions_mut()
        .insert(AuthContext::new(claims.sub, claims.roles));

    Ok(next.run(req).await)
}

fn unauthorized(details: impl Into<String>) -> Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthorized", details)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("missing authorization header"))?;

    let header = header
        .to_str()
        .map_err(|_| unauthorized("malformed authorization header"))?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized("expected a bearer token"))?;

    let token = header.trim();
    if token.is_empty() {
        return Err(unauthorized("empty bearer token"));
    }

    Ok(token)
}
