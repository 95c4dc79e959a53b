use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::dto::{LoginRequest, LoginResponse};
use crate::middleware::AuthenticatedUser;
use crate::models::UserResponse;
use crate::services::auth_service::AuthService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::ValidatedJson;

/// Routes reachable without a token
pub fn public_auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

pub fn protected_auth_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let service = AuthService::new(state.gateway(), state.jwt_config());
    Ok(Json(service.login(request).await?))
}

async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<UserResponse>, AppError> {
    let service = AuthService::new(state.gateway(), state.jwt_config());
    Ok(Json(service.current_user(&user.email).await?))
}
