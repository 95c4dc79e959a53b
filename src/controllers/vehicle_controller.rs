use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::models::{Vehicle, VehicleFilters, VehicleStatus};
use crate::store::{ChangeSet, EntityKind, StoreGateway};
use crate::utils::errors::{conflict_error, validation_error, AppResult};
use crate::utils::validation::normalize_optional;

pub struct VehicleController {
    store: StoreGateway,
}

fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

impl VehicleController {
    pub fn new(store: StoreGateway) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateVehicleRequest) -> AppResult<Vehicle> {
        let now = Utc::now();
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            model: request.model.trim().to_string(),
            license_plate: normalize_plate(&request.license_plate),
            vehicle_type: request.vehicle_type,
            max_capacity: request.max_capacity,
            odometer: request.odometer.unwrap_or(0),
            region: normalize_optional(request.region),
            acquisition_cost: request.acquisition_cost.unwrap_or(Decimal::ZERO),
            status: VehicleStatus::Available,
            active_trip_id: None,
            open_maintenance: 0,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        self.store.commit(ChangeSet::new().insert(vehicle.clone())).await?;
        info!("🚛 Vehicle {} registered ({})", vehicle.id, vehicle.license_plate);
        Ok(vehicle)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Vehicle> {
        self.store.require_vehicle(id).await
    }

    pub async fn list(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        self.store.list_vehicles(filters).await
    }

    pub async fn update(&self, id: Uuid, request: UpdateVehicleRequest) -> AppResult<Vehicle> {
        let request = &request;
        self.store
            .with_retries("vehicle update", move || self.try_update(id, request))
            .await
    }

    async fn try_update(&self, id: Uuid, request: &UpdateVehicleRequest) -> AppResult<Vehicle> {
        let mut vehicle = self.store.require_vehicle(id).await?;

        if let Some(odometer) = request.odometer {
            if odometer != vehicle.odometer && vehicle.active_trip_id.is_some() {
                return Err(conflict_error(format!(
                    "Vehicle {} is on a trip; its odometer is set when the trip completes",
                    id
                )));
            }
            if odometer < vehicle.odometer {
                return Err(validation_error(
                    "odometer",
                    format!("Odometer cannot go back from {} to {}", vehicle.odometer, odometer),
                ));
            }
            vehicle.odometer = odometer;
        }

        if let Some(name) = &request.name {
            vehicle.name = name.trim().to_string();
        }
        if let Some(model) = &request.model {
            vehicle.model = model.trim().to_string();
        }
        if let Some(plate) = &request.license_plate {
            vehicle.license_plate = normalize_plate(plate);
        }
        if let Some(vehicle_type) = request.vehicle_type {
            vehicle.vehicle_type = vehicle_type;
        }
        if let Some(capacity) = request.max_capacity {
            vehicle.max_capacity = capacity;
        }
        if request.region.is_some() {
            vehicle.region = normalize_optional(request.region.clone());
        }
        if let Some(cost) = request.acquisition_cost {
            vehicle.acquisition_cost = cost;
        }

        let expected = vehicle.revise();
        self.store
            .commit(ChangeSet::new().update(vehicle.clone(), expected))
            .await?;
        Ok(vehicle)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.store
            .with_retries("vehicle delete", move || self.try_delete(id))
            .await
    }

    async fn try_delete(&self, id: Uuid) -> AppResult<()> {
        let vehicle = self.store.require_vehicle(id).await?;
        let references = self.store.reference_count(EntityKind::Vehicle, id).await?;
        if references > 0 {
            return Err(conflict_error(format!(
                "Vehicle {} is referenced by {} trips, maintenance records or expenses",
                id, references
            )));
        }

        self.store
            .commit(ChangeSet::new().delete(EntityKind::Vehicle, id, vehicle.version))
            .await?;
        info!("🗑️ Vehicle {} deleted", id);
        Ok(())
    }
}
