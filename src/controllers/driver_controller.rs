use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::{CreateDriverRequest, UpdateDriverRequest};
use crate::models::{Driver, DriverFilters, DriverStatus};
use crate::store::{ChangeSet, EntityKind, StoreGateway};
use crate::utils::errors::{conflict_error, validation_error, AppResult};

pub struct DriverController {
    store: StoreGateway,
}

impl DriverController {
    pub fn new(store: StoreGateway) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateDriverRequest) -> AppResult<Driver> {
        let now = Utc::now();
        let mut license_categories = Vec::with_capacity(request.license_categories.len());
        for category in request.license_categories {
            if !license_categories.contains(&category) {
                license_categories.push(category);
            }
        }

        let driver = Driver {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            phone: request.phone.trim().to_string(),
            license_categories,
            license_expiry: request.license_expiry,
            safety_score: request.safety_score.unwrap_or(100),
            status: DriverStatus::OnDuty,
            trips_completed: 0,
            active_trip_id: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        self.store.commit(ChangeSet::new().insert(driver.clone())).await?;
        info!("🧑‍✈️ Driver {} registered", driver.id);
        Ok(driver)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Driver> {
        self.store.require_driver(id).await
    }

    pub async fn list(&self, filters: &DriverFilters) -> AppResult<Vec<Driver>> {
        self.store.list_drivers(filters).await
    }

    pub async fn update(&self, id: Uuid, request: UpdateDriverRequest) -> AppResult<Driver> {
        if request.status.is_some_and(|status| !status.is_externally_settable()) {
            return Err(validation_error(
                "status",
                "On Trip is set by trip assignment, not by hand",
            ));
        }

        let request = &request;
        self.store
            .with_retries("driver update", move || self.try_update(id, request))
            .await
    }

    async fn try_update(&self, id: Uuid, request: &UpdateDriverRequest) -> AppResult<Driver> {
        let mut driver = self.store.require_driver(id).await?;

        if let Some(status) = request.status {
            if status != driver.status {
                if let Some(trip_id) = driver.active_trip_id {
                    warn!("Status change for driver {} refused: on trip {}", id, trip_id);
                    return Err(conflict_error(format!(
                        "Driver {} is assigned to trip {} and cannot become {}",
                        id, trip_id, status
                    )));
                }
                driver.status = status;
            }
        }

        if let Some(name) = &request.name {
            driver.name = name.trim().to_string();
        }
        if let Some(phone) = &request.phone {
            driver.phone = phone.trim().to_string();
        }
        if let Some(categories) = &request.license_categories {
            driver.license_categories = categories.clone();
        }
        if let Some(expiry) = request.license_expiry {
            driver.license_expiry = expiry;
        }
        if let Some(score) = request.safety_score {
            driver.safety_score = score;
        }

        let expected = driver.revise();
        self.store
            .commit(ChangeSet::new().update(driver.clone(), expected))
            .await?;
        Ok(driver)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.store
            .with_retries("driver delete", move || self.try_delete(id))
            .await
    }

    async fn try_delete(&self, id: Uuid) -> AppResult<()> {
        let driver = self.store.require_driver(id).await?;
        let references = self.store.reference_count(EntityKind::Driver, id).await?;
        if references > 0 {
            return Err(conflict_error(format!(
                "Driver {} is referenced by {} trips",
                id, references
            )));
        }

        self.store
            .commit(ChangeSet::new().delete(EntityKind::Driver, id, driver.version))
            .await?;
        info!("🗑️ Driver {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fixtures::{driver, seed, store, trip_request, vehicle};
    use crate::controllers::trip_controller::TripController;
    use crate::utils::errors::AppError;

    fn suspend() -> UpdateDriverRequest {
        UpdateDriverRequest {
            status: Some(DriverStatus::Suspended),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_suspension_rules() {
        let (_, gateway) = store();
        let (v, d) = (vehicle(0), driver());
        seed(&gateway, &v, &d).await;
        let controller = DriverController::new(gateway.clone());

        let trip = TripController::new(gateway.clone())
            .create(trip_request(&v, &d))
            .await
            .unwrap();
        assert!(matches!(controller.update(d.id, suspend()).await, Err(AppError::Conflict(_))));

        TripController::new(gateway.clone()).cancel(trip.id).await.unwrap();
        let suspended = controller.update(d.id, suspend()).await.unwrap();
        assert_eq!(suspended.status, DriverStatus::Suspended);

        let back = controller
            .update(
                d.id,
                UpdateDriverRequest {
                    status: Some(DriverStatus::OnDuty),
                    safety_score: Some(80),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(back.status, DriverStatus::OnDuty);
        assert_eq!(back.safety_score, 80);
    }

    #[tokio::test]
    async fn test_on_trip_cannot_be_set_by_hand() {
        let (_, gateway) = store();
        let (v, d) = (vehicle(0), driver());
        seed(&gateway, &v, &d).await;

        let result = DriverController::new(gateway)
            .update(
                d.id,
                UpdateDriverRequest {
                    status: Some(DriverStatus::OnTrip),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_guarded_by_trip_history() {
        let (_, gateway) = store();
        let (v, d) = (vehicle(0), driver());
        seed(&gateway, &v, &d).await;
        let trip = TripController::new(gateway.clone())
            .create(trip_request(&v, &d))
            .await
            .unwrap();
        TripController::new(gateway.clone()).cancel(trip.id).await.unwrap();

        let controller = DriverController::new(gateway.clone());
        assert!(matches!(controller.delete(d.id).await, Err(AppError::Conflict(_))));

        let (spare_vehicle, spare) = (vehicle(0), driver());
        seed(&gateway, &spare_vehicle, &spare).await;
        controller.delete(spare.id).await.unwrap();
        assert!(matches!(controller.get(spare.id).await, Err(AppError::NotFound(_))));
    }
}
