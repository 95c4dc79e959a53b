//! Store gateway
//!
//! Controllers talk to the entity store through this wrapper. Each call is
//! bounded by the configured store timeout, and whole transitions are rerun
//! from fresh reads when a commit loses an optimistic version check.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use super::{ChangeSet, EntityKind, EntityStore};
use crate::models::{
    Driver, DriverFilters, Expense, ExpenseFilters, Maintenance, MaintenanceFilters, Trip,
    TripFilters, User, Vehicle, VehicleFilters,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct StoreGateway {
    store: Arc<dyn EntityStore>,
    timeout: Duration,
    retries: u32,
}

impl StoreGateway {
    pub fn new(store: Arc<dyn EntityStore>, timeout: Duration, retries: u32) -> Self {
        Self {
            store,
            timeout,
            retries,
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("⏱️ Entity store {} timed out after {:?}", operation, self.timeout);
                Err(AppError::Dependency(format!(
                    "Entity store did not answer {} within {} ms",
                    operation,
                    self.timeout.as_millis()
                )))
            }
        }
    }

    /// Run `transition` until it commits, rerunning it on stale writes.
    /// Any other outcome, success or failure, is returned as is.
    pub async fn with_retries<T, F, Fut>(&self, operation: &str, mut transition: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match transition().await {
                Err(AppError::StaleWrite(msg)) if attempt < self.retries => {
                    attempt += 1;
                    debug!("🔁 {} lost a version check ({}), retry {}/{}", operation, msg, attempt, self.retries);
                }
                Err(AppError::StaleWrite(msg)) => {
                    warn!("{} still stale after {} retries: {}", operation, self.retries, msg);
                    return Err(AppError::StaleWrite(msg));
                }
                other => return other,
            }
        }
    }

    pub async fn vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        self.bounded("vehicle lookup", self.store.vehicle(id)).await
    }

    pub async fn driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        self.bounded("driver lookup", self.store.driver(id)).await
    }

    pub async fn trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        self.bounded("trip lookup", self.store.trip(id)).await
    }

    pub async fn maintenance(&self, id: Uuid) -> AppResult<Option<Maintenance>> {
        self.bounded("maintenance lookup", self.store.maintenance(id)).await
    }

    pub async fn expense(&self, id: Uuid) -> AppResult<Option<Expense>> {
        self.bounded("expense lookup", self.store.expense(id)).await
    }

    pub async fn require_vehicle(&self, id: Uuid) -> AppResult<Vehicle> {
        self.vehicle(id).await?.ok_or_else(|| not_found_error("Vehicle", id))
    }

    pub async fn require_driver(&self, id: Uuid) -> AppResult<Driver> {
        self.driver(id).await?.ok_or_else(|| not_found_error("Driver", id))
    }

    pub async fn require_trip(&self, id: Uuid) -> AppResult<Trip> {
        self.trip(id).await?.ok_or_else(|| not_found_error("Trip", id))
    }

    pub async fn require_maintenance(&self, id: Uuid) -> AppResult<Maintenance> {
        self.maintenance(id)
            .await?
            .ok_or_else(|| not_found_error("Maintenance record", id))
    }

    pub async fn require_expense(&self, id: Uuid) -> AppResult<Expense> {
        self.expense(id).await?.ok_or_else(|| not_found_error("Expense", id))
    }

    pub async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        self.bounded("vehicle listing", self.store.list_vehicles(filters)).await
    }

    pub async fn list_drivers(&self, filters: &DriverFilters) -> AppResult<Vec<Driver>> {
        self.bounded("driver listing", self.store.list_drivers(filters)).await
    }

    pub async fn list_trips(&self, filters: &TripFilters) -> AppResult<Vec<Trip>> {
        self.bounded("trip listing", self.store.list_trips(filters)).await
    }

    pub async fn list_maintenance(&self, filters: &MaintenanceFilters) -> AppResult<Vec<Maintenance>> {
        self.bounded("maintenance listing", self.store.list_maintenance(filters))
            .await
    }

    pub async fn list_expenses(&self, filters: &ExpenseFilters) -> AppResult<Vec<Expense>> {
        self.bounded("expense listing", self.store.list_expenses(filters)).await
    }

    pub async fn open_maintenance_count(&self, vehicle_id: Uuid) -> AppResult<i64> {
        self.bounded("open maintenance count", self.store.open_maintenance_count(vehicle_id))
            .await
    }

    pub async fn reference_count(&self, kind: EntityKind, id: Uuid) -> AppResult<i64> {
        self.bounded("reference count", self.store.reference_count(kind, id))
            .await
    }

    pub async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.bounded("user lookup", self.store.user_by_email(email)).await
    }

    pub async fn insert_user(&self, user: User) -> AppResult<()> {
        self.bounded("user insert", self.store.insert_user(user)).await
    }

    pub async fn commit(&self, changes: ChangeSet) -> AppResult<()> {
        debug!("Committing {} writes", changes.len());
        self.bounded("commit", self.store.commit(changes)).await
    }
}
