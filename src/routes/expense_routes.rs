use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::expense_controller::ExpenseController;
use crate::dto::CreateExpenseRequest;
use crate::middleware::require_roles;
use crate::models::{Expense, ExpenseDetail, ExpenseFilters};
use crate::services::authorization_service::EXPENSE_WRITERS;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extractors::{QueryParams, ValidatedJson};

pub fn create_expense_router() -> Router<AppState> {
    let writers = from_fn_with_state(EXPENSE_WRITERS, require_roles);

    Router::new()
        .route(
            "/",
            get(list_expenses).merge(post(create_expense).route_layer(writers.clone())),
        )
        .route(
            "/:id",
            get(get_expense).merge(delete(delete_expense).route_layer(writers)),
        )
}

async fn create_expense(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let controller = ExpenseController::new(state.gateway());
    let expense = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn list_expenses(
    State(state): State<AppState>,
    QueryParams(filters): QueryParams<ExpenseFilters>,
) -> Result<Json<Vec<ExpenseDetail>>, AppError> {
    let controller = ExpenseController::new(state.gateway());
    Ok(Json(controller.list(&filters).await?))
}

async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseDetail>, AppError> {
    let controller = ExpenseController::new(state.gateway());
    Ok(Json(controller.get(id).await?))
}

async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let controller = ExpenseController::new(state.gateway());
    controller.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
