//! JWT authentication middleware
//!
//! Verifies the bearer token and injects an [`AuthenticatedUser`] into the
//! request extensions for the handlers behind it. Write routes add
//! [`require_roles`] on top, which refuses the caller before any extractor
//! reads the body.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    models::UserRole,
    services::authorization_service::authorize,
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Caller identity injected into requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &state.jwt_config())?;

    let user = AuthenticatedUser {
        user_id: claims.user_id()?,
        email: claims.email,
        role: claims.role,
    };
    debug!("🔐 {} authenticated as {}", user.email, user.role);

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Role gate for write routes. Must sit inside `auth_middleware`.
pub async fn require_roles(
    State(required_roles): State<&'static [UserRole]>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| AppError::Unauthorized("Authorization token required".to_string()))?;
    authorize(user, required_roles)?;

    Ok(next.run(request).await)
}
