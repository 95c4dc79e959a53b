//! Vehicle model
//!
//! A vehicle has two independent availability axes: the road axis
//! (`active_trip_id`) and the shop axis (`open_maintenance`). The reported
//! `status` is derived from both and stored alongside for cheap filtering.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Vehicle class, also used as a driver license category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_type")]
pub enum VehicleType {
    Truck,
    Van,
    Bike,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Truck => "Truck",
            VehicleType::Van => "Van",
            VehicleType::Bike => "Bike",
        }
    }
}

// Driver license categories are stored as `vehicle_type[]`
impl PgHasArrayType for VehicleType {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_vehicle_type")
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Truck" => Ok(VehicleType::Truck),
            "Van" => Ok(VehicleType::Van),
            "Bike" => Ok(VehicleType::Bike),
            other => Err(format!("unknown vehicle type '{}'", other)),
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reported vehicle status - maps to the `vehicle_status` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_status")]
pub enum VehicleStatus {
    Available,
    #[serde(rename = "On Trip")]
    #[sqlx(rename = "On Trip")]
    OnTrip,
    #[serde(rename = "In Shop")]
    #[sqlx(rename = "In Shop")]
    InShop,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "Available",
            VehicleStatus::OnTrip => "On Trip",
            VehicleStatus::InShop => "In Shop",
        }
    }

    /// Resolve both axes. The shop axis wins over the road axis.
    pub fn derive(active_trip_id: Option<Uuid>, open_maintenance: i32) -> Self {
        if open_maintenance > 0 {
            VehicleStatus::InShop
        } else if active_trip_id.is_some() {
            VehicleStatus::OnTrip
        } else {
            VehicleStatus::Available
        }
    }
}

impl FromStr for VehicleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Available" => Ok(VehicleStatus::Available),
            "On Trip" => Ok(VehicleStatus::OnTrip),
            "In Shop" => Ok(VehicleStatus::InShop),
            other => Err(format!("unknown vehicle status '{}'", other)),
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub model: String,
    pub license_plate: String,
    pub vehicle_type: VehicleType,
    /// kg
    pub max_capacity: Decimal,
    /// km
    pub odometer: i64,
    pub region: Option<String>,
    pub acquisition_cost: Decimal,
    pub status: VehicleStatus,
    pub active_trip_id: Option<Uuid>,
    pub open_maintenance: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn is_available(&self) -> bool {
        self.active_trip_id.is_none() && self.open_maintenance == 0
    }

    pub fn is_in_shop(&self) -> bool {
        self.open_maintenance > 0
    }

    pub fn reserve_for(&mut self, trip_id: Uuid) {
        self.active_trip_id = Some(trip_id);
        self.refresh_status();
    }

    /// Free the road axis if it is held by `trip_id`
    pub fn release_trip(&mut self, trip_id: Uuid) {
        if self.active_trip_id == Some(trip_id) {
            self.active_trip_id = None;
        }
        self.refresh_status();
    }

    pub fn advance_odometer(&mut self, reading: i64) {
        self.odometer = reading;
    }

    pub fn occupy_service_bay(&mut self) {
        self.open_maintenance += 1;
        self.refresh_status();
    }

    pub fn release_service_bay(&mut self) {
        self.open_maintenance = (self.open_maintenance - 1).max(0);
        self.refresh_status();
    }

    pub fn refresh_status(&mut self) {
        self.status = VehicleStatus::derive(self.active_trip_id, self.open_maintenance);
    }

    /// Bump the version and return the one this revision was computed from
    pub fn revise(&mut self) -> i64 {
        let expected = self.version;
        self.version += 1;
        self.updated_at = Utc::now();
        expected
    }
}

/// Query filters for vehicle listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilters {
    pub status: Option<VehicleStatus>,
    pub vehicle_type: Option<VehicleType>,
    pub region: Option<String>,
}

impl VehicleFilters {
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        self.status.map_or(true, |s| vehicle.status == s)
            && self.vehicle_type.map_or(true, |t| vehicle.vehicle_type == t)
            && self
                .region
                .as_deref()
                .map_or(true, |r| vehicle.region.as_deref() == Some(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vehicle {
        let now = Utc::now();
        Vehicle {
            id: Uuid::new_v4(),
            name: "Bharat Express 01".to_string(),
            model: "Tata Prima".to_string(),
            license_plate: "MH-12-PQ-1234".to_string(),
            vehicle_type: VehicleType::Truck,
            max_capacity: Decimal::from(15_000),
            odometer: 45_000,
            region: Some("West".to_string()),
            acquisition_cost: Decimal::from(3_500_000),
            status: VehicleStatus::Available,
            active_trip_id: None,
            open_maintenance: 0,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_shop_axis_takes_precedence() {
        let trip = Some(Uuid::new_v4());
        assert_eq!(VehicleStatus::derive(None, 0), VehicleStatus::Available);
        assert_eq!(VehicleStatus::derive(trip, 0), VehicleStatus::OnTrip);
        assert_eq!(VehicleStatus::derive(trip, 1), VehicleStatus::InShop);
        assert_eq!(VehicleStatus::derive(None, 2), VehicleStatus::InShop);
    }

    #[test]
    fn test_release_only_frees_matching_trip() {
        let mut vehicle = sample();
        let trip = Uuid::new_v4();
        vehicle.reserve_for(trip);
        vehicle.release_trip(Uuid::new_v4());
        assert_eq!(vehicle.status, VehicleStatus::OnTrip);
        vehicle.release_trip(trip);
        assert_eq!(vehicle.status, VehicleStatus::Available);
    }

    #[test]
    fn test_service_bay_counter_never_goes_negative() {
        let mut vehicle = sample();
        vehicle.occupy_service_bay();
        vehicle.occupy_service_bay();
        vehicle.release_service_bay();
        assert_eq!(vehicle.status, VehicleStatus::InShop);
        vehicle.release_service_bay();
        vehicle.release_service_bay();
        assert_eq!(vehicle.open_maintenance, 0);
        assert_eq!(vehicle.status, VehicleStatus::Available);
    }

    #[test]
    fn test_status_serde_uses_display_names() {
        assert_eq!(serde_json::to_string(&VehicleStatus::OnTrip).unwrap(), "\"On Trip\"");
        assert_eq!("In Shop".parse::<VehicleStatus>().unwrap(), VehicleStatus::InShop);
        assert!("Parked".parse::<VehicleStatus>().is_err());
    }

    #[test]
    fn test_filters() {
        let vehicle = sample();
        let filters = VehicleFilters {
            status: Some(VehicleStatus::Available),
            vehicle_type: None,
            region: Some("West".to_string()),
        };
        assert!(filters.matches(&vehicle));
        let filters = VehicleFilters {
            region: Some("North".to_string()),
            ..Default::default()
        };
        assert!(!filters.matches(&vehicle));
    }

    #[test]
    fn test_revise_bumps_version() {
        let mut vehicle = sample();
        assert_eq!(vehicle.revise(), 1);
        assert_eq!(vehicle.version, 2);
    }
}
