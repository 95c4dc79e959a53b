//! Maintenance workflow
//!
//! Opening a record occupies a service bay on the vehicle; completing it
//! frees one. The vehicle leaves the shop only when no record is open.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::dto::CreateMaintenanceRequest;
use crate::models::{
    Maintenance, MaintenanceDetail, MaintenanceFilters, MaintenanceStatus, Vehicle,
};
use crate::services::status_model::{
    apply_maintenance_effects, guard_maintenance_completion, maintenance_side_effects,
};
use crate::store::{ChangeSet, StoreGateway};
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::normalize_optional;

pub struct MaintenanceController {
    store: StoreGateway,
}

impl MaintenanceController {
    pub fn new(store: StoreGateway) -> Self {
        Self { store }
    }

    pub async fn open(&self, request: CreateMaintenanceRequest) -> AppResult<Maintenance> {
        let service_type = request.service_type.trim().to_string();
        if service_type.is_empty() {
            return Err(validation_error("service_type", "Service type is required"));
        }
        let cost = request.cost.unwrap_or(Decimal::ZERO);
        if cost < Decimal::ZERO {
            return Err(validation_error("cost", "Cost cannot be negative"));
        }

        let now = Utc::now();
        let status = request.status.unwrap_or(MaintenanceStatus::InProgress);
        let record = Maintenance {
            id: Uuid::new_v4(),
            vehicle_id: request.vehicle_id,
            service_type,
            description: normalize_optional(request.description),
            cost,
            service_date: request.service_date.unwrap_or_else(|| now.date_naive()),
            next_due_date: request.next_due_date,
            status,
            completed_at: (!status.is_open()).then_some(now),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        if matches!(record.next_due_date, Some(due) if due < record.service_date) {
            return Err(validation_error(
                "next_due_date",
                "Next due date cannot be before the service date",
            ));
        }

        let record = &record;
        self.store
            .with_retries("maintenance open", move || self.try_open(record))
            .await
    }

    async fn try_open(&self, record: &Maintenance) -> AppResult<Maintenance> {
        let mut vehicle = self.store.vehicle(record.vehicle_id).await?.ok_or_else(|| {
            validation_error("vehicle_id", format!("Vehicle {} does not exist", record.vehicle_id))
        })?;

        let effects = maintenance_side_effects(None, record.status);
        let mut changes = ChangeSet::new().insert(record.clone());
        if !effects.is_empty() {
            let expected = vehicle.revise();
            apply_maintenance_effects(effects, &mut vehicle);
            changes = changes.update(vehicle.clone(), expected);
        }

        self.store.commit(changes).await?;

        info!(
            "🔧 Maintenance {} ({}) logged as {} for vehicle {}, vehicle now {}",
            record.id, record.service_type, record.status, vehicle.id, vehicle.status
        );
        Ok(record.clone())
    }

    pub async fn complete(&self, id: Uuid) -> AppResult<Maintenance> {
        self.store
            .with_retries("maintenance complete", move || self.try_complete(id))
            .await
    }

    async fn try_complete(&self, id: Uuid) -> AppResult<Maintenance> {
        let mut record = self.store.require_maintenance(id).await?;
        let from = record.status;
        let next = guard_maintenance_completion(id, from)?;

        let mut vehicle = self.store.require_vehicle(record.vehicle_id).await?;
        // Trust the records over the counter: it includes this one
        let open = self.store.open_maintenance_count(vehicle.id).await?;
        vehicle.open_maintenance = i32::try_from(open).unwrap_or(i32::MAX);

        let record_version = record.revise();
        record.status = next;
        record.completed_at = Some(record.updated_at);

        let vehicle_version = vehicle.revise();
        apply_maintenance_effects(maintenance_side_effects(Some(from), next), &mut vehicle);

        self.store
            .commit(
                ChangeSet::new()
                    .update(record.clone(), record_version)
                    .update(vehicle.clone(), vehicle_version),
            )
            .await?;

        info!(
            "✅ Maintenance {} {} -> {}, vehicle {} now {} ({} open)",
            record.id, from, record.status, vehicle.id, vehicle.status, vehicle.open_maintenance
        );
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<MaintenanceDetail> {
        let record = self.store.require_maintenance(id).await?;
        let vehicle = self.store.vehicle(record.vehicle_id).await?;
        Ok(MaintenanceDetail { record, vehicle })
    }

    pub async fn list(&self, filters: &MaintenanceFilters) -> AppResult<Vec<MaintenanceDetail>> {
        let records = self.store.list_maintenance(filters).await?;
        let mut vehicles: HashMap<Uuid, Option<Vehicle>> = HashMap::new();
        let mut details = Vec::with_capacity(records.len());

        for record in records {
            if !vehicles.contains_key(&record.vehicle_id) {
                let vehicle = self.store.vehicle(record.vehicle_id).await?;
                vehicles.insert(record.vehicle_id, vehicle);
            }
            details.push(MaintenanceDetail {
                vehicle: vehicles.get(&record.vehicle_id).cloned().flatten(),
                record,
            });
        }

        Ok(details)
    }
}
