use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::middleware::require_roles;
use crate::models::{Vehicle, VehicleFilters};
use crate::services::authorization_service::FLEET_MANAGERS;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::{QueryParams, ValidatedJson};

pub fn create_vehicle_router() -> Router<AppState> {
    let managers = from_fn_with_state(FLEET_MANAGERS, require_roles);

    Router::new()
        .route(
            "/",
            get(list_vehicles).merge(post(create_vehicle).route_layer(managers.clone())),
        )
        .route(
            "/:id",
            get(get_vehicle).merge(
                patch(update_vehicle)
                    .delete(delete_vehicle)
                    .route_layer(managers),
            ),
        )
}

async fn create_vehicle(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    let controller = VehicleController::new(state.gateway());
    let vehicle = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

async fn list_vehicles(
    State(state): State<AppState>,
    QueryParams(filters): QueryParams<VehicleFilters>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let controller = VehicleController::new(state.gateway());
    Ok(Json(controller.list(&filters).await?))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, AppError> {
    let controller = VehicleController::new(state.gateway());
    Ok(Json(controller.get(id).await?))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateVehicleRequest>,
) -> Result<Json<Vehicle>, AppError> {
    let controller = VehicleController::new(state.gateway());
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let controller = VehicleController::new(state.gateway());
    controller.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
