//! Driver model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::vehicle::VehicleType;

/// Driver status - maps to the `driver_status` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "driver_status")]
pub enum DriverStatus {
    #[serde(rename = "On Duty")]
    #[sqlx(rename = "On Duty")]
    OnDuty,
    #[serde(rename = "On Trip")]
    #[sqlx(rename = "On Trip")]
    OnTrip,
    Suspended,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::OnDuty => "On Duty",
            DriverStatus::OnTrip => "On Trip",
            DriverStatus::Suspended => "Suspended",
        }
    }

    /// `On Trip` is owned by the trip lifecycle and cannot be set by hand
    pub fn is_externally_settable(&self) -> bool {
        !matches!(self, DriverStatus::OnTrip)
    }
}

impl FromStr for DriverStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "On Duty" => Ok(DriverStatus::OnDuty),
            "On Trip" => Ok(DriverStatus::OnTrip),
            "Suspended" => Ok(DriverStatus::Suspended),
            other => Err(format!("unknown driver status '{}'", other)),
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub license_categories: Vec<VehicleType>,
    pub license_expiry: NaiveDate,
    pub safety_score: i32,
    pub status: DriverStatus,
    pub trips_completed: i32,
    pub active_trip_id: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    pub fn is_assignable(&self) -> bool {
        self.status == DriverStatus::OnDuty && self.active_trip_id.is_none()
    }

    pub fn license_expired_on(&self, day: NaiveDate) -> bool {
        self.license_expiry < day
    }

    /// An empty category list means the license is not restricted.
    pub fn is_licensed_for(&self, vehicle_type: VehicleType) -> bool {
        self.license_categories.is_empty() || self.license_categories.contains(&vehicle_type)
    }

    pub fn assign(&mut self, trip_id: Uuid) {
        self.active_trip_id = Some(trip_id);
        self.status = DriverStatus::OnTrip;
    }

    /// Back on duty if `trip_id` is the trip holding this driver
    pub fn release(&mut self, trip_id: Uuid) {
        if self.active_trip_id == Some(trip_id) {
            self.active_trip_id = None;
            if self.status == DriverStatus::OnTrip {
                self.status = DriverStatus::OnDuty;
            }
        }
    }

    pub fn record_completed_trip(&mut self) {
        self.trips_completed += 1;
    }

    pub fn revise(&mut self) -> i64 {
        let expected = self.version;
        self.version += 1;
        self.updated_at = Utc::now();
        expected
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriverFilters {
    pub status: Option<DriverStatus>,
}

impl DriverFilters {
    pub fn matches(&self, driver: &Driver) -> bool {
        self.status.map_or(true, |s| driver.status == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Driver {
        let now = Utc::now();
        Driver {
            id: Uuid::new_v4(),
            name: "Rajesh Kumar".to_string(),
            phone: "9876543210".to_string(),
            license_categories: vec![VehicleType::Truck, VehicleType::Van],
            license_expiry: NaiveDate::from_ymd_opt(2028, 12, 31).unwrap(),
            safety_score: 92,
            status: DriverStatus::OnDuty,
            trips_completed: 45,
            active_trip_id: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_assign_and_release() {
        let mut driver = sample();
        let trip = Uuid::new_v4();
        driver.assign(trip);
        assert_eq!(driver.status, DriverStatus::OnTrip);
        assert!(!driver.is_assignable());

        driver.release(trip);
        assert_eq!(driver.status, DriverStatus::OnDuty);
        assert!(driver.is_assignable());
    }

    #[test]
    fn test_release_for_other_trip_is_ignored() {
        let mut driver = sample();
        driver.assign(Uuid::new_v4());
        driver.release(Uuid::new_v4());
        assert_eq!(driver.status, DriverStatus::OnTrip);
    }

    #[test]
    fn test_license_checks() {
        let mut driver = sample();
        assert!(driver.is_licensed_for(VehicleType::Van));
        assert!(!driver.is_licensed_for(VehicleType::Bike));
        driver.license_categories.clear();
        assert!(driver.is_licensed_for(VehicleType::Bike));

        let day = NaiveDate::from_ymd_opt(2029, 1, 1).unwrap();
        assert!(driver.license_expired_on(day));
        assert!(!driver.license_expired_on(driver.license_expiry));
    }

    #[test]
    fn test_suspended_driver_is_not_assignable() {
        let mut driver = sample();
        driver.status = DriverStatus::Suspended;
        assert!(!driver.is_assignable());
        assert!(DriverStatus::Suspended.is_externally_settable());
        assert!(!DriverStatus::OnTrip.is_externally_settable());
    }
}
