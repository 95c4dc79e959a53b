//! Records and stores shared by controller tests

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dto::CreateTripRequest;
use crate::models::{Driver, DriverStatus, Vehicle, VehicleStatus, VehicleType};
use crate::store::{ChangeSet, MemoryStore, StoreGateway};

pub fn store() -> (Arc<MemoryStore>, StoreGateway) {
    let memory = Arc::new(MemoryStore::new());
    let gateway = StoreGateway::new(memory.clone(), Duration::from_secs(2), 3);
    (memory, gateway)
}

pub fn vehicle(odometer: i64) -> Vehicle {
    let now = Utc::now();
    let id = Uuid::new_v4();
    Vehicle {
        id,
        name: "Van-05".to_string(),
        model: "Tata Ace".to_string(),
        license_plate: format!("MH-{}", &id.simple().to_string()[..8]).to_uppercase(),
        vehicle_type: VehicleType::Van,
        max_capacity: Decimal::from(500),
        odometer,
        region: Some("West".to_string()),
        acquisition_cost: Decimal::from(650_000),
        status: VehicleStatus::Available,
        active_trip_id: None,
        open_maintenance: 0,
        version: 1,
        created_at: now,
        updated_at: now,
    }
}

pub fn driver() -> Driver {
    let now = Utc::now();
    Driver {
        id: Uuid::new_v4(),
        name: "Alex".to_string(),
        phone: "9876543210".to_string(),
        license_categories: vec![VehicleType::Van, VehicleType::Truck],
        license_expiry: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap(),
        safety_score: 92,
        status: DriverStatus::OnDuty,
        trips_completed: 4,
        active_trip_id: None,
        version: 1,
        created_at: now,
        updated_at: now,
    }
}

pub async fn seed(gateway: &StoreGateway, vehicle: &Vehicle, driver: &Driver) {
    gateway
        .commit(ChangeSet::new().insert(vehicle.clone()).insert(driver.clone()))
        .await
        .unwrap();
}

pub fn trip_request(vehicle: &Vehicle, driver: &Driver) -> CreateTripRequest {
    CreateTripRequest {
        vehicle_id: Some(vehicle.id),
        driver_id: Some(driver.id),
        origin: "Mumbai".to_string(),
        destination: "Pune".to_string(),
        cargo_weight: Some(Decimal::from(450)),
        revenue: Some(Decimal::from(12_000)),
        start_odometer: Some(vehicle.odometer),
        start_date: None,
    }
}
