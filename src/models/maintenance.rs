//! Maintenance model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::vehicle::Vehicle;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "maintenance_status")]
pub enum MaintenanceStatus {
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    Completed,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::InProgress => "In Progress",
            MaintenanceStatus::Completed => "Completed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, MaintenanceStatus::InProgress)
    }
}

impl FromStr for MaintenanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "In Progress" => Ok(MaintenanceStatus::InProgress),
            "Completed" => Ok(MaintenanceStatus::Completed),
            other => Err(format!("unknown maintenance status '{}'", other)),
        }
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Maintenance {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub service_type: String,
    pub description: Option<String>,
    pub cost: Decimal,
    pub service_date: NaiveDate,
    pub next_due_date: Option<NaiveDate>,
    pub status: MaintenanceStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Maintenance {
    pub fn revise(&mut self) -> i64 {
        let expected = self.version;
        self.version += 1;
        self.updated_at = Utc::now();
        expected
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceDetail {
    #[serde(flatten)]
    pub record: Maintenance,
    pub vehicle: Option<Vehicle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaintenanceFilters {
    pub vehicle_id: Option<Uuid>,
    pub status: Option<MaintenanceStatus>,
}

impl MaintenanceFilters {
    pub fn matches(&self, record: &Maintenance) -> bool {
        self.vehicle_id.map_or(true, |id| record.vehicle_id == id)
            && self.status.map_or(true, |s| record.status == s)
    }
}
