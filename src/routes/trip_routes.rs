use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::trip_controller::TripController;
use crate::dto::{CompleteTripRequest, CreateTripRequest};
use crate::middleware::require_roles;
use crate::models::{Trip, TripDetail, TripFilters};
use crate::services::authorization_service::FLEET_MANAGERS;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::{QueryParams, ValidatedJson};

pub fn create_trip_router() -> Router<AppState> {
    let managers = from_fn_with_state(FLEET_MANAGERS, require_roles);

    Router::new()
        .route(
            "/",
            get(list_trips).merge(post(create_trip).route_layer(managers.clone())),
        )
        .route("/:id", get(get_trip))
        .route(
            "/:id/dispatch",
            patch(dispatch_trip).route_layer(managers.clone()),
        )
        .route(
            "/:id/complete",
            patch(complete_trip).route_layer(managers.clone()),
        )
        .route("/:id/cancel", patch(cancel_trip).route_layer(managers))
}

async fn create_trip(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateTripRequest>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let controller = TripController::new(state.gateway());
    let trip = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn list_trips(
    State(state): State<AppState>,
    QueryParams(filters): QueryParams<TripFilters>,
) -> Result<Json<Vec<TripDetail>>, AppError> {
    let controller = TripController::new(state.gateway());
    Ok(Json(controller.list(&filters).await?))
}

async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripDetail>, AppError> {
    let controller = TripController::new(state.gateway());
    Ok(Json(controller.get(id).await?))
}

async fn dispatch_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    let controller = TripController::new(state.gateway());
    Ok(Json(controller.dispatch(id).await?))
}

async fn complete_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CompleteTripRequest>,
) -> Result<Json<Trip>, AppError> {
    let controller = TripController::new(state.gateway());
    Ok(Json(controller.complete(id, request).await?))
}

async fn cancel_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    let controller = TripController::new(state.gateway());
    Ok(Json(controller.cancel(id).await?))
}
