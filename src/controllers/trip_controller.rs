//! Trip lifecycle
//!
//! Every transition reads the trip and the records it holds, runs the status
//! model on local copies and commits the result as one change set. A lost
//! version race reruns the whole transition from fresh reads.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::{CompleteTripRequest, CreateTripRequest};
use crate::models::{
    Driver, Trip, TripAction, TripDetail, TripFilters, TripStatus, Vehicle,
};
use crate::services::status_model::{apply_trip_effects, guard_trip_transition, trip_side_effects};
use crate::store::{ChangeSet, EntityKind, StoreGateway};
use crate::utils::errors::{conflict_error, validation_error, AppResult};

pub struct TripController {
    store: StoreGateway,
}

/// Fields of a new trip once required values are known to be present
struct NewTrip {
    vehicle_id: Uuid,
    driver_id: Uuid,
    origin: String,
    destination: String,
    cargo_weight: Decimal,
    revenue: Decimal,
    start_odometer: i64,
    start_date: chrono::DateTime<Utc>,
}

impl TryFrom<CreateTripRequest> for NewTrip {
    type Error = crate::utils::errors::AppError;

    fn try_from(request: CreateTripRequest) -> Result<Self, Self::Error> {
        let origin = request.origin.trim().to_string();
        let destination = request.destination.trim().to_string();
        if origin.is_empty() {
            return Err(validation_error("origin", "Origin is required"));
        }
        if destination.is_empty() {
            return Err(validation_error("destination", "Destination is required"));
        }

        let cargo_weight = request
            .cargo_weight
            .ok_or_else(|| validation_error("cargo_weight", "Cargo weight is required"))?;
        if cargo_weight <= Decimal::ZERO {
            return Err(validation_error("cargo_weight", "Cargo weight must be positive"));
        }

        let revenue = request.revenue.unwrap_or(Decimal::ZERO);
        if revenue < Decimal::ZERO {
            return Err(validation_error("revenue", "Revenue cannot be negative"));
        }

        Ok(Self {
            vehicle_id: request
                .vehicle_id
                .ok_or_else(|| validation_error("vehicle_id", "Vehicle is required"))?,
            driver_id: request
                .driver_id
                .ok_or_else(|| validation_error("driver_id", "Driver is required"))?,
            origin,
            destination,
            cargo_weight,
            revenue,
            start_odometer: request
                .start_odometer
                .ok_or_else(|| validation_error("start_odometer", "Start odometer is required"))?,
            start_date: request.start_date.unwrap_or_else(Utc::now),
        })
    }
}

impl TripController {
    pub fn new(store: StoreGateway) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateTripRequest) -> AppResult<Trip> {
        let new_trip = NewTrip::try_from(request)?;
        let new_trip = &new_trip;
        self.store
            .with_retries("trip create", move || self.try_create(new_trip))
            .await
    }

    async fn try_create(&self, new_trip: &NewTrip) -> AppResult<Trip> {
        let mut vehicle = self.store.vehicle(new_trip.vehicle_id).await?.ok_or_else(|| {
            validation_error("vehicle_id", format!("Vehicle {} does not exist", new_trip.vehicle_id))
        })?;
        let mut driver = self.store.driver(new_trip.driver_id).await?.ok_or_else(|| {
            validation_error("driver_id", format!("Driver {} does not exist", new_trip.driver_id))
        })?;

        check_assignment(new_trip, &vehicle, &driver)?;

        let now = Utc::now();
        let trip = Trip {
            id: Uuid::new_v4(),
            vehicle_id: vehicle.id,
            driver_id: driver.id,
            origin: new_trip.origin.clone(),
            destination: new_trip.destination.clone(),
            cargo_weight: new_trip.cargo_weight,
            revenue: new_trip.revenue,
            start_odometer: new_trip.start_odometer,
            end_odometer: None,
            status: TripStatus::Draft,
            start_date: new_trip.start_date,
            dispatched_at: None,
            end_date: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let vehicle_version = vehicle.revise();
        let driver_version = driver.revise();
        apply_trip_effects(
            trip_side_effects(None, TripStatus::Draft),
            &trip,
            &mut vehicle,
            &mut driver,
        );

        self.store
            .commit(
                ChangeSet::new()
                    .insert(trip.clone())
                    .update(vehicle, vehicle_version)
                    .update(driver, driver_version),
            )
            .await?;

        info!(
            "🚚 Trip {} created: vehicle {} and driver {} reserved ({} -> {})",
            trip.id, trip.vehicle_id, trip.driver_id, trip.origin, trip.destination
        );
        Ok(trip)
    }

    pub async fn dispatch(&self, id: Uuid) -> AppResult<Trip> {
        self.store
            .with_retries("trip dispatch", move || self.try_dispatch(id))
            .await
    }

    async fn try_dispatch(&self, id: Uuid) -> AppResult<Trip> {
        let mut trip = self.store.require_trip(id).await?;
        let from = trip.status;
        let next = guard_trip_transition(&trip, TripAction::Dispatch)?;

        let vehicle = self.store.require_vehicle(trip.vehicle_id).await?;
        if vehicle.is_in_shop() {
            warn!("Dispatch of trip {} refused: vehicle {} is in the shop", id, vehicle.id);
            return Err(conflict_error(format!(
                "Vehicle {} entered the shop and cannot be dispatched",
                vehicle.id
            )));
        }

        let expected = trip.revise();
        trip.status = next;
        trip.dispatched_at = Some(trip.updated_at);

        self.store
            .commit(
                ChangeSet::new()
                    .update(trip.clone(), expected)
                    .check(EntityKind::Vehicle, vehicle.id, vehicle.version),
            )
            .await?;

        info!("📤 Trip {} {} -> {}", trip.id, from, trip.status);
        Ok(trip)
    }

    pub async fn complete(&self, id: Uuid, request: CompleteTripRequest) -> AppResult<Trip> {
        let end_odometer = request
            .end_odometer
            .ok_or_else(|| validation_error("end_odometer", "End odometer is required"))?;

        self.store
            .with_retries("trip complete", move || self.try_complete(id, end_odometer))
            .await
    }

    async fn try_complete(&self, id: Uuid, end_odometer: i64) -> AppResult<Trip> {
        let mut trip = self.store.require_trip(id).await?;
        let from = trip.status;
        let next = guard_trip_transition(&trip, TripAction::Complete)?;

        if end_odometer < trip.start_odometer {
            return Err(validation_error(
                "end_odometer",
                format!(
                    "End odometer {} is below the start odometer {}",
                    end_odometer, trip.start_odometer
                ),
            ));
        }

        let mut vehicle = self.store.require_vehicle(trip.vehicle_id).await?;
        let mut driver = self.store.require_driver(trip.driver_id).await?;

        let trip_version = trip.revise();
        trip.status = next;
        trip.end_odometer = Some(end_odometer);
        trip.end_date = Some(trip.updated_at);

        let vehicle_version = vehicle.revise();
        let driver_version = driver.revise();
        apply_trip_effects(trip_side_effects(Some(from), next), &trip, &mut vehicle, &mut driver);

        self.store
            .commit(
                ChangeSet::new()
                    .update(trip.clone(), trip_version)
                    .update(vehicle, vehicle_version)
                    .update(driver, driver_version),
            )
            .await?;

        info!(
            "🏁 Trip {} {} -> {} at {} km",
            trip.id, from, trip.status, end_odometer
        );
        Ok(trip)
    }

    pub async fn cancel(&self, id: Uuid) -> AppResult<Trip> {
        self.store
            .with_retries("trip cancel", move || self.try_cancel(id))
            .await
    }

    async fn try_cancel(&self, id: Uuid) -> AppResult<Trip> {
        let mut trip = self.store.require_trip(id).await?;
        let from = trip.status;
        let next = guard_trip_transition(&trip, TripAction::Cancel)?;

        let mut vehicle = self.store.require_vehicle(trip.vehicle_id).await?;
        let mut driver = self.store.require_driver(trip.driver_id).await?;

        let trip_version = trip.revise();
        trip.status = next;
        trip.end_date = Some(trip.updated_at);

        let vehicle_version = vehicle.revise();
        let driver_version = driver.revise();
        apply_trip_effects(trip_side_effects(Some(from), next), &trip, &mut vehicle, &mut driver);

        self.store
            .commit(
                ChangeSet::new()
                    .update(trip.clone(), trip_version)
                    .update(vehicle, vehicle_version)
                    .update(driver, driver_version),
            )
            .await?;

        info!("🛑 Trip {} {} -> {}", trip.id, from, trip.status);
        Ok(trip)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<TripDetail> {
        let trip = self.store.require_trip(id).await?;
        let (vehicle, driver) = futures::try_join!(
            self.store.vehicle(trip.vehicle_id),
            self.store.driver(trip.driver_id)
        )?;
        Ok(TripDetail {
            trip,
            vehicle,
            driver,
        })
    }

    /// Trips with their vehicle and driver resolved
    pub async fn list(&self, filters: &TripFilters) -> AppResult<Vec<TripDetail>> {
        let trips = self.store.list_trips(filters).await?;

        let mut vehicles: HashMap<Uuid, Option<Vehicle>> = HashMap::new();
        let mut drivers: HashMap<Uuid, Option<Driver>> = HashMap::new();
        let mut details = Vec::with_capacity(trips.len());

        for trip in trips {
            if !vehicles.contains_key(&trip.vehicle_id) {
                let vehicle = self.store.vehicle(trip.vehicle_id).await?;
                vehicles.insert(trip.vehicle_id, vehicle);
            }
            if !drivers.contains_key(&trip.driver_id) {
                let driver = self.store.driver(trip.driver_id).await?;
                drivers.insert(trip.driver_id, driver);
            }
            details.push(TripDetail {
                vehicle: vehicles.get(&trip.vehicle_id).cloned().flatten(),
                driver: drivers.get(&trip.driver_id).cloned().flatten(),
                trip,
            });
        }

        Ok(details)
    }
}

/// Availability conflicts first, then the trip's fields against the records it uses
fn check_assignment(new_trip: &NewTrip, vehicle: &Vehicle, driver: &Driver) -> AppResult<()> {
    if !vehicle.is_available() {
        warn!("Vehicle {} is {}, trip refused", vehicle.id, vehicle.status);
        return Err(conflict_error(format!(
            "Vehicle {} is not available ({})",
            vehicle.id, vehicle.status
        )));
    }
    if !driver.is_assignable() {
        warn!("Driver {} is {}, trip refused", driver.id, driver.status);
        return Err(conflict_error(format!(
            "Driver {} is not available ({})",
            driver.id, driver.status
        )));
    }

    if new_trip.cargo_weight > vehicle.max_capacity {
        return Err(validation_error(
            "cargo_weight",
            format!(
                "Cargo weight {} kg exceeds the vehicle capacity of {} kg",
                new_trip.cargo_weight, vehicle.max_capacity
            ),
        ));
    }
    if new_trip.start_odometer < vehicle.odometer {
        return Err(validation_error(
            "start_odometer",
            format!(
                "Start odometer {} is below the vehicle reading {}",
                new_trip.start_odometer, vehicle.odometer
            ),
        ));
    }
    if driver.license_expired_on(Utc::now().date_naive()) {
        return Err(validation_error(
            "driver_id",
            format!("License of driver {} expired on {}", driver.id, driver.license_expiry),
        ));
    }
    if !driver.is_licensed_for(vehicle.vehicle_type) {
        return Err(validation_error(
            "driver_id",
            format!("Driver {} is not licensed for {}", driver.id, vehicle.vehicle_type),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::fixtures::{driver, seed, store, trip_request, vehicle};
    use crate::models::{DriverStatus, VehicleStatus};
    use crate::store::MemoryStore;
    use crate::utils::errors::AppError;
    use chrono::NaiveDate;
    use std::sync::Arc;

    async fn reload(gateway: &StoreGateway, trip: &Trip) -> (Trip, Vehicle, Driver) {
        (
            gateway.require_trip(trip.id).await.unwrap(),
            gateway.require_vehicle(trip.vehicle_id).await.unwrap(),
            gateway.require_driver(trip.driver_id).await.unwrap(),
        )
    }

    async fn created_trip() -> (Arc<MemoryStore>, StoreGateway, Trip) {
        let (memory, gateway) = store();
        let (v, d) = (vehicle(1_000), driver());
        seed(&gateway, &v, &d).await;
        let trip = TripController::new(gateway.clone())
            .create(trip_request(&v, &d))
            .await
            .unwrap();
        (memory, gateway, trip)
    }

    #[tokio::test]
    async fn test_dispatch_and_complete_scenario() {
        let (_, gateway, trip) = created_trip().await;
        let controller = TripController::new(gateway.clone());

        let (stored, v, d) = reload(&gateway, &trip).await;
        assert_eq!(stored.status, TripStatus::Draft);
        assert_eq!(v.status, VehicleStatus::OnTrip);
        assert_eq!(d.status, DriverStatus::OnTrip);

        let dispatched = controller.dispatch(trip.id).await.unwrap();
        assert_eq!(dispatched.status, TripStatus::Dispatched);
        assert!(dispatched.dispatched_at.is_some());

        let completed = controller
            .complete(trip.id, CompleteTripRequest { end_odometer: Some(1_200) })
            .await
            .unwrap();
        assert_eq!(completed.status, TripStatus::Completed);
        assert_eq!(completed.end_odometer, Some(1_200));
        assert!(completed.end_date.is_some());

        let (_, v, d) = reload(&gateway, &trip).await;
        assert_eq!(v.odometer, 1_200);
        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(v.active_trip_id, None);
        assert_eq!(d.status, DriverStatus::OnDuty);
        assert_eq!(d.trips_completed, 5);
    }

    #[tokio::test]
    async fn test_complete_straight_from_draft() {
        let (_, gateway, trip) = created_trip().await;
        let completed = TripController::new(gateway.clone())
            .complete(trip.id, CompleteTripRequest { end_odometer: Some(1_000) })
            .await
            .unwrap();
        assert_eq!(completed.status, TripStatus::Completed);
        let (_, v, d) = reload(&gateway, &trip).await;
        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(d.trips_completed, 5);
    }

    #[tokio::test]
    async fn test_create_then_cancel_restores_statuses() {
        let (_, gateway, trip) = created_trip().await;
        let cancelled = TripController::new(gateway.clone()).cancel(trip.id).await.unwrap();
        assert_eq!(cancelled.status, TripStatus::Cancelled);
        assert_eq!(cancelled.end_odometer, None);

        let (_, v, d) = reload(&gateway, &trip).await;
        assert_eq!(v.status, VehicleStatus::Available);
        assert_eq!(v.odometer, 1_000);
        assert_eq!(d.status, DriverStatus::OnDuty);
        assert_eq!(d.trips_completed, 4);
    }

    #[tokio::test]
    async fn test_terminal_trips_reject_every_action() {
        let (_, gateway, trip) = created_trip().await;
        let controller = TripController::new(gateway.clone());
        controller.cancel(trip.id).await.unwrap();

        assert!(matches!(controller.dispatch(trip.id).await, Err(AppError::Conflict(_))));
        assert!(matches!(controller.cancel(trip.id).await, Err(AppError::Conflict(_))));
        assert!(matches!(
            controller
                .complete(trip.id, CompleteTripRequest { end_odometer: Some(2_000) })
                .await,
            Err(AppError::Conflict(_))
        ));

        let (_, _, d) = reload(&gateway, &trip).await;
        assert_eq!(d.trips_completed, 4);
    }

    #[tokio::test]
    async fn test_double_dispatch_is_conflict() {
        let (_, gateway, trip) = created_trip().await;
        let controller = TripController::new(gateway);
        controller.dispatch(trip.id).await.unwrap();
        assert!(matches!(controller.dispatch(trip.id).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_end_odometer_below_start_is_rejected() {
        let (_, gateway, trip) = created_trip().await;
        let controller = TripController::new(gateway.clone());

        let result = controller
            .complete(trip.id, CompleteTripRequest { end_odometer: Some(999) })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        let missing = controller.complete(trip.id, CompleteTripRequest::default()).await;
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let (stored, v, _) = reload(&gateway, &trip).await;
        assert_eq!(stored.status, TripStatus::Draft);
        assert_eq!(v.odometer, 1_000);
    }

    #[tokio::test]
    async fn test_unknown_trip_is_not_found() {
        let (_, gateway) = store();
        let controller = TripController::new(gateway);
        assert!(matches!(
            controller.dispatch(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unresolved_references_are_validation_errors() {
        let (_, gateway) = store();
        let (v, d) = (vehicle(0), driver());
        let result = TripController::new(gateway).create(trip_request(&v, &d)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_busy_vehicle_and_driver_conflict() {
        let (_, gateway, trip) = created_trip().await;
        let controller = TripController::new(gateway.clone());
        let (busy_vehicle, busy_driver) = (
            gateway.require_vehicle(trip.vehicle_id).await.unwrap(),
            gateway.require_driver(trip.driver_id).await.unwrap(),
        );

        let other_driver = driver();
        let other_vehicle = vehicle(0);
        seed(&gateway, &other_vehicle, &other_driver).await;

        let result = controller.create(trip_request(&busy_vehicle, &other_driver)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        let result = controller.create(trip_request(&other_vehicle, &busy_driver)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_creation_field_guards() {
        let (_, gateway) = store();
        let controller = TripController::new(gateway.clone());
        let v = vehicle(5_000);
        let mut d = driver();
        seed(&gateway, &v, &d).await;

        let mut overweight = trip_request(&v, &d);
        overweight.cargo_weight = Some(Decimal::from(501));
        assert!(matches!(controller.create(overweight).await, Err(AppError::Validation(_))));

        let mut rolled_back = trip_request(&v, &d);
        rolled_back.start_odometer = Some(4_999);
        assert!(matches!(controller.create(rolled_back).await, Err(AppError::Validation(_))));

        let mut blank = trip_request(&v, &d);
        blank.origin = "  ".to_string();
        assert!(matches!(controller.create(blank).await, Err(AppError::Validation(_))));

        let mut missing_start = trip_request(&v, &d);
        missing_start.start_odometer = None;
        assert!(matches!(controller.create(missing_start).await, Err(AppError::Validation(_))));

        // Expired and wrongly licensed drivers
        d.license_expiry = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        let expired = driver_with(&gateway, d.clone()).await;
        assert!(matches!(
            controller.create(trip_request(&v, &expired)).await,
            Err(AppError::Validation(_))
        ));

        let mut bikes_only = driver();
        bikes_only.license_categories = vec![crate::models::VehicleType::Bike];
        let bikes_only = driver_with(&gateway, bikes_only).await;
        assert!(matches!(
            controller.create(trip_request(&v, &bikes_only)).await,
            Err(AppError::Validation(_))
        ));

        let untouched = gateway.require_vehicle(v.id).await.unwrap();
        assert_eq!(untouched.status, VehicleStatus::Available);
        assert_eq!(untouched.version, v.version);
    }

    async fn driver_with(gateway: &StoreGateway, mut d: Driver) -> Driver {
        d.id = Uuid::new_v4();
        gateway.commit(ChangeSet::new().insert(d.clone())).await.unwrap();
        d
    }

    #[tokio::test]
    async fn test_suspended_driver_cannot_take_trip() {
        let (_, gateway) = store();
        let v = vehicle(0);
        let mut d = driver();
        d.status = DriverStatus::Suspended;
        seed(&gateway, &v, &d).await;

        let result = TripController::new(gateway).create(trip_request(&v, &d)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_dispatch_refused_when_vehicle_entered_shop() {
        let (_, gateway, trip) = created_trip().await;
        let mut v = gateway.require_vehicle(trip.vehicle_id).await.unwrap();
        let expected = v.revise();
        v.occupy_service_bay();
        gateway.commit(ChangeSet::new().update(v, expected)).await.unwrap();

        let controller = TripController::new(gateway.clone());
        assert!(matches!(controller.dispatch(trip.id).await, Err(AppError::Conflict(_))));

        // Cancelling still frees the road axis but the shop keeps the vehicle
        controller.cancel(trip.id).await.unwrap();
        let (_, v, d) = reload(&gateway, &trip).await;
        assert_eq!(v.status, VehicleStatus::InShop);
        assert_eq!(v.active_trip_id, None);
        assert_eq!(d.status, DriverStatus::OnDuty);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_no_partial_writes() {
        let (memory, gateway, trip) = created_trip().await;
        memory.fail_next_commits(1);

        let result = TripController::new(gateway.clone())
            .complete(trip.id, CompleteTripRequest { end_odometer: Some(1_500) })
            .await;
        assert!(matches!(result, Err(AppError::Dependency(_))));

        let (stored, v, d) = reload(&gateway, &trip).await;
        assert_eq!(stored.status, TripStatus::Draft);
        assert_eq!(v.status, VehicleStatus::OnTrip);
        assert_eq!(v.odometer, 1_000);
        assert_eq!(d.trips_completed, 4);

        // Retrying the whole transition succeeds
        TripController::new(gateway.clone())
            .complete(trip.id, CompleteTripRequest { end_odometer: Some(1_500) })
            .await
            .unwrap();
        let (_, v, d) = reload(&gateway, &trip).await;
        assert_eq!(v.odometer, 1_500);
        assert_eq!(d.trips_completed, 5);
    }

    #[tokio::test]
    async fn test_lost_version_race_is_retried() {
        let (memory, gateway, trip) = created_trip().await;
        memory.interfere_before_next_commit(EntityKind::Driver, trip.driver_id);

        let completed = TripController::new(gateway.clone())
            .complete(trip.id, CompleteTripRequest { end_odometer: Some(1_100) })
            .await
            .unwrap();
        assert_eq!(completed.status, TripStatus::Completed);

        let (_, _, d) = reload(&gateway, &trip).await;
        assert_eq!(d.trips_completed, 5);
    }

    #[tokio::test]
    async fn test_concurrent_completes_count_once() {
        let (_, gateway, trip) = created_trip().await;
        let first = TripController::new(gateway.clone());
        let second = TripController::new(gateway.clone());

        let (a, b) = tokio::join!(
            first.complete(trip.id, CompleteTripRequest { end_odometer: Some(1_300) }),
            second.complete(trip.id, CompleteTripRequest { end_odometer: Some(1_300) }),
        );
        assert!(a.is_ok() ^ b.is_ok());

        let (_, _, d) = reload(&gateway, &trip).await;
        assert_eq!(d.trips_completed, 5);
    }

    #[tokio::test]
    async fn test_list_populates_references() {
        let (_, gateway, trip) = created_trip().await;
        let controller = TripController::new(gateway);

        let all = controller.list(&TripFilters::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].vehicle.as_ref().map(|v| v.id), Some(trip.vehicle_id));
        assert_eq!(all[0].driver.as_ref().map(|d| d.id), Some(trip.driver_id));

        let none = controller
            .list(&TripFilters {
                status: Some(TripStatus::Completed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());

        let detail = controller.get(trip.id).await.unwrap();
        assert_eq!(detail.trip.id, trip.id);
    }
}
