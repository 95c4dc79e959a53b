use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::driver_controller::DriverController;
use crate::dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::middleware::require_roles;
use crate::models::{Driver, DriverFilters};
use crate::services::authorization_service::{DRIVER_EDITORS, FLEET_MANAGERS};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::{QueryParams, ValidatedJson};

pub fn create_driver_router() -> Router<AppState> {
    let managers = from_fn_with_state(FLEET_MANAGERS, require_roles);
    let editors = from_fn_with_state(DRIVER_EDITORS, require_roles);

    Router::new()
        .route(
            "/",
            get(list_drivers).merge(post(create_driver).route_layer(managers.clone())),
        )
        .route(
            "/:id",
            get(get_driver)
                .merge(patch(update_driver).route_layer(editors))
                .merge(delete(delete_driver).route_layer(managers)),
        )
}

async fn create_driver(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateDriverRequest>,
) -> Result<(StatusCode, Json<Driver>), AppError> {
    let controller = DriverController::new(state.gateway());
    let driver = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

async fn list_drivers(
    State(state): State<AppState>,
    QueryParams(filters): QueryParams<DriverFilters>,
) -> Result<Json<Vec<Driver>>, AppError> {
    let controller = DriverController::new(state.gateway());
    Ok(Json(controller.list(&filters).await?))
}

async fn get_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    let controller = DriverController::new(state.gateway());
    Ok(Json(controller.get(id).await?))
}

// Safety officers may edit profiles and suspend, but not create or delete
async fn update_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    let controller = DriverController::new(state.gateway());
    Ok(Json(controller.update(id, request).await?))
}

async fn delete_driver(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let controller = DriverController::new(state.gateway());
    controller.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
