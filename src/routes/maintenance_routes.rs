use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::maintenance_controller::MaintenanceController;
use crate::dto::CreateMaintenanceRequest;
use crate::middleware::require_roles;
use crate::models::{Maintenance, MaintenanceDetail, MaintenanceFilters};
use crate::services::authorization_service::FLEET_MANAGERS;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::{QueryParams, ValidatedJson};

pub fn create_maintenance_router() -> Router<AppState> {
    let managers = from_fn_with_state(FLEET_MANAGERS, require_roles);

    Router::new()
        .route(
            "/",
            get(list_maintenance).merge(post(open_maintenance).route_layer(managers.clone())),
        )
        .route("/:id", get(get_maintenance))
        .route(
            "/:id/complete",
            patch(complete_maintenance).route_layer(managers),
        )
}

async fn open_maintenance(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateMaintenanceRequest>,
) -> Result<(StatusCode, Json<Maintenance>), AppError> {
    let controller = MaintenanceController::new(state.gateway());
    let record = controller.open(request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_maintenance(
    State(state): State<AppState>,
    QueryParams(filters): QueryParams<MaintenanceFilters>,
) -> Result<Json<Vec<MaintenanceDetail>>, AppError> {
    let controller = MaintenanceController::new(state.gateway());
    Ok(Json(controller.list(&filters).await?))
}

async fn get_maintenance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MaintenanceDetail>, AppError> {
    let controller = MaintenanceController::new(state.gateway());
    Ok(Json(controller.get(id).await?))
}

async fn complete_maintenance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Maintenance>, AppError> {
    let controller = MaintenanceController::new(state.gateway());
    Ok(Json(controller.complete(id).await?))
}
