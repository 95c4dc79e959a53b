use std::collections::HashMap;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::dto::CreateExpenseRequest;
use crate::models::{Expense, ExpenseDetail, ExpenseFilters, ExpenseType, Trip, Vehicle};
use crate::store::{ChangeSet, EntityKind, StoreGateway};
use crate::utils::errors::{validation_error, AppResult};

pub struct ExpenseController {
    store: StoreGateway,
}

impl ExpenseController {
    pub fn new(store: StoreGateway) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateExpenseRequest) -> AppResult<Expense> {
        match (request.expense_type, request.liters) {
            (ExpenseType::Fuel, None) => {
                return Err(validation_error("liters", "Fuel expenses need a quantity in liters"))
            }
            (ExpenseType::Fuel, Some(_)) | (_, None) => {}
            (_, Some(_)) => {
                return Err(validation_error("liters", "Only fuel expenses carry liters"))
            }
        }

        self.store.vehicle(request.vehicle_id).await?.ok_or_else(|| {
            validation_error("vehicle_id", format!("Vehicle {} does not exist", request.vehicle_id))
        })?;

        if let Some(trip_id) = request.trip_id {
            let trip = self.store.trip(trip_id).await?.ok_or_else(|| {
                validation_error("trip_id", format!("Trip {} does not exist", trip_id))
            })?;
            if trip.vehicle_id != request.vehicle_id {
                return Err(validation_error(
                    "trip_id",
                    format!("Trip {} was run with a different vehicle", trip_id),
                ));
            }
        }

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            vehicle_id: request.vehicle_id,
            trip_id: request.trip_id,
            expense_type: request.expense_type,
            cost: request.cost,
            liters: request.liters,
            date: request.date.unwrap_or_else(|| now.date_naive()),
            version: 1,
            created_at: now,
        };

        self.store.commit(ChangeSet::new().insert(expense.clone())).await?;
        info!(
            "💸 {:?} expense {} of {} for vehicle {}",
            expense.expense_type, expense.id, expense.cost, expense.vehicle_id
        );
        Ok(expense)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ExpenseDetail> {
        let expense = self.store.require_expense(id).await?;
        let vehicle = self.store.vehicle(expense.vehicle_id).await?;
        let trip = match expense.trip_id {
            Some(trip_id) => self.store.trip(trip_id).await?,
            None => None,
        };
        Ok(ExpenseDetail {
            expense,
            vehicle,
            trip,
        })
    }

    pub async fn list(&self, filters: &ExpenseFilters) -> AppResult<Vec<ExpenseDetail>> {
        let expenses = self.store.list_expenses(filters).await?;
        let mut vehicles: HashMap<Uuid, Option<Vehicle>> = HashMap::new();
        let mut trips: HashMap<Uuid, Option<Trip>> = HashMap::new();
        let mut details = Vec::with_capacity(expenses.len());

        for expense in expenses {
            if !vehicles.contains_key(&expense.vehicle_id) {
                let vehicle = self.store.vehicle(expense.vehicle_id).await?;
                vehicles.insert(expense.vehicle_id, vehicle);
            }
            let trip = match expense.trip_id {
                Some(trip_id) => {
                    if !trips.contains_key(&trip_id) {
                        let trip = self.store.trip(trip_id).await?;
                        trips.insert(trip_id, trip);
                    }
                    trips.get(&trip_id).cloned().flatten()
                }
                None => None,
            };
            details.push(ExpenseDetail {
                vehicle: vehicles.get(&expense.vehicle_id).cloned().flatten(),
                trip,
                expense,
            });
        }

        Ok(details)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let expense = self.store.require_expense(id).await?;
        self.store
            .commit(ChangeSet::new().delete(EntityKind::Expense, id, expense.version))
            .await?;
        info!("🗑️ Expense {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fixtures::{driver, seed, store, trip_request, vehicle};
    use crate::controllers::trip_controller::TripController;
    use crate::utils::errors::AppError;
    use rust_decimal::Decimal;

    fn fuel(vehicle_id: Uuid, trip_id: Option<Uuid>) -> CreateExpenseRequest {
        CreateExpenseRequest {
            vehicle_id,
            trip_id,
            expense_type: ExpenseType::Fuel,
            cost: Decimal::from(4_200),
            liters: Some(Decimal::from(42)),
            date: None,
        }
    }

    #[tokio::test]
    async fn test_fuel_expense_for_trip() {
        let (_, gateway) = store();
        let (v, d) = (vehicle(0), driver());
        seed(&gateway, &v, &d).await;
        let trip = TripController::new(gateway.clone())
            .create(trip_request(&v, &d))
            .await
            .unwrap();

        let controller = ExpenseController::new(gateway.clone());
        let expense = controller.create(fuel(v.id, Some(trip.id))).await.unwrap();

        let listed = controller
            .list(&ExpenseFilters {
                trip_id: Some(trip.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].expense.id, expense.id);
        assert_eq!(listed[0].trip.as_ref().map(|t| t.id), Some(trip.id));

        controller.delete(expense.id).await.unwrap();
        assert!(matches!(controller.get(expense.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_liters_rules_and_references() {
        let (_, gateway) = store();
        let (v, d) = (vehicle(0), driver());
        seed(&gateway, &v, &d).await;
        let controller = ExpenseController::new(gateway.clone());

        let mut no_liters = fuel(v.id, None);
        no_liters.liters = None;
        assert!(matches!(controller.create(no_liters).await, Err(AppError::Validation(_))));

        let mut toll = fuel(v.id, None);
        toll.expense_type = ExpenseType::Toll;
        assert!(matches!(controller.create(toll).await, Err(AppError::Validation(_))));

        assert!(matches!(
            controller.create(fuel(Uuid::new_v4(), None)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            controller.create(fuel(v.id, Some(Uuid::new_v4()))).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_trip_must_match_vehicle() {
        let (_, gateway) = store();
        let (v, d) = (vehicle(0), driver());
        let (other, other_driver) = (vehicle(0), driver());
        seed(&gateway, &v, &d).await;
        seed(&gateway, &other, &other_driver).await;
        let trip = TripController::new(gateway.clone())
            .create(trip_request(&v, &d))
            .await
            .unwrap();

        let result = ExpenseController::new(gateway)
            .create(fuel(other.id, Some(trip.id)))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
