//! Trip model
//!
//! `TripStatus` is a closed set with an explicit transition table. Any
//! (status, action) pair missing from the table is rejected.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::driver::Driver;
use super::vehicle::Vehicle;

/// Trip status - maps to the `trip_status` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "trip_status")]
pub enum TripStatus {
    Draft,
    Dispatched,
    Completed,
    Cancelled,
}

/// Actions a caller can request on an existing trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripAction {
    Dispatch,
    Complete,
    Cancel,
}

impl TripAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripAction::Dispatch => "dispatch",
            TripAction::Complete => "complete",
            TripAction::Cancel => "cancel",
        }
    }
}

impl fmt::Display for TripAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Draft => "Draft",
            TripStatus::Dispatched => "Dispatched",
            TripStatus::Completed => "Completed",
            TripStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    /// Draft and Dispatched trips hold their vehicle and driver
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Transition table. `None` means the action is illegal from this status.
    pub fn next(&self, action: TripAction) -> Option<TripStatus> {
        use TripAction::*;
        use TripStatus::*;

        match (self, action) {
            (Draft, Dispatch) => Some(Dispatched),
            (Draft | Dispatched, Complete) => Some(Completed),
            (Draft | Dispatched, Cancel) => Some(Cancelled),
            _ => None,
        }
    }
}

impl FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Draft" => Ok(TripStatus::Draft),
            "Dispatched" => Ok(TripStatus::Dispatched),
            "Completed" => Ok(TripStatus::Completed),
            "Cancelled" => Ok(TripStatus::Cancelled),
            other => Err(format!("unknown trip status '{}'", other)),
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Trip {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub origin: String,
    pub destination: String,
    /// kg
    pub cargo_weight: Decimal,
    pub revenue: Decimal,
    pub start_odometer: i64,
    pub end_odometer: Option<i64>,
    pub status: TripStatus,
    pub start_date: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn revise(&mut self) -> i64 {
        let expected = self.version;
        self.version += 1;
        self.updated_at = Utc::now();
        expected
    }
}

/// Trip with its vehicle and driver resolved
#[derive(Debug, Clone, Serialize)]
pub struct TripDetail {
    #[serde(flatten)]
    pub trip: Trip,
    pub vehicle: Option<Vehicle>,
    pub driver: Option<Driver>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripFilters {
    pub status: Option<TripStatus>,
    pub vehicle_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
}

impl TripFilters {
    pub fn matches(&self, trip: &Trip) -> bool {
        self.status.map_or(true, |s| trip.status == s)
            && self.vehicle_id.map_or(true, |id| trip.vehicle_id == id)
            && self.driver_id.map_or(true, |id| trip.driver_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TripStatus; 4] = [
        TripStatus::Draft,
        TripStatus::Dispatched,
        TripStatus::Completed,
        TripStatus::Cancelled,
    ];

    #[test]
    fn test_transition_table() {
        assert_eq!(TripStatus::Draft.next(TripAction::Dispatch), Some(TripStatus::Dispatched));
        assert_eq!(TripStatus::Draft.next(TripAction::Complete), Some(TripStatus::Completed));
        assert_eq!(TripStatus::Dispatched.next(TripAction::Complete), Some(TripStatus::Completed));
        assert_eq!(TripStatus::Dispatched.next(TripAction::Cancel), Some(TripStatus::Cancelled));
        assert_eq!(TripStatus::Dispatched.next(TripAction::Dispatch), None);
    }

    #[test]
    fn test_terminal_states_absorb_every_action() {
        for status in ALL.iter().filter(|s| s.is_terminal()) {
            for action in [TripAction::Dispatch, TripAction::Complete, TripAction::Cancel] {
                assert_eq!(status.next(action), None, "{} -> {}", status, action);
            }
        }
    }

    #[test]
    fn test_status_names_round_trip() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<TripStatus>().unwrap(), status);
        }
        assert!("Archived".parse::<TripStatus>().is_err());
    }
}
