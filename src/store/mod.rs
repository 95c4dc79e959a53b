//! Entity store
//!
//! Typed reads per entity kind plus one atomic `commit` for writes. A commit
//! applies a whole [`ChangeSet`] or nothing. Updates, deletes and checks name
//! the version they were computed from; a mismatch aborts the set with
//! [`AppError::StaleWrite`].

pub mod gateway;
pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Driver, DriverFilters, Expense, ExpenseFilters, Maintenance, MaintenanceFilters, Trip,
    TripFilters, User, Vehicle, VehicleFilters,
};
use crate::utils::errors::AppResult;

pub use gateway::StoreGateway;
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Vehicle,
    Driver,
    Trip,
    Maintenance,
    Expense,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Vehicle => "Vehicle",
            EntityKind::Driver => "Driver",
            EntityKind::Trip => "Trip",
            EntityKind::Maintenance => "Maintenance",
            EntityKind::Expense => "Expense",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Vehicle(Vehicle),
    Driver(Driver),
    Trip(Trip),
    Maintenance(Maintenance),
    Expense(Expense),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Vehicle(_) => EntityKind::Vehicle,
            Record::Driver(_) => EntityKind::Driver,
            Record::Trip(_) => EntityKind::Trip,
            Record::Maintenance(_) => EntityKind::Maintenance,
            Record::Expense(_) => EntityKind::Expense,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Record::Vehicle(v) => v.id,
            Record::Driver(d) => d.id,
            Record::Trip(t) => t.id,
            Record::Maintenance(m) => m.id,
            Record::Expense(e) => e.id,
        }
    }
}

impl From<Vehicle> for Record {
    fn from(value: Vehicle) -> Self {
        Record::Vehicle(value)
    }
}

impl From<Driver> for Record {
    fn from(value: Driver) -> Self {
        Record::Driver(value)
    }
}

impl From<Trip> for Record {
    fn from(value: Trip) -> Self {
        Record::Trip(value)
    }
}

impl From<Maintenance> for Record {
    fn from(value: Maintenance) -> Self {
        Record::Maintenance(value)
    }
}

impl From<Expense> for Record {
    fn from(value: Expense) -> Self {
        Record::Expense(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Insert(Record),
    /// Replace the stored record. It must still be at `expected_version`.
    Update {
        record: Record,
        expected_version: i64,
    },
    Delete {
        kind: EntityKind,
        id: Uuid,
        expected_version: i64,
    },
    /// Assert a record read during the transition has not moved on
    Check {
        kind: EntityKind,
        id: Uuid,
        expected_version: i64,
    },
}

/// Writes of one lifecycle transition, committed together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    writes: Vec<Write>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, record: impl Into<Record>) -> Self {
        self.writes.push(Write::Insert(record.into()));
        self
    }

    pub fn update(mut self, record: impl Into<Record>, expected_version: i64) -> Self {
        self.writes.push(Write::Update {
            record: record.into(),
            expected_version,
        });
        self
    }

    pub fn delete(mut self, kind: EntityKind, id: Uuid, expected_version: i64) -> Self {
        self.writes.push(Write::Delete {
            kind,
            id,
            expected_version,
        });
        self
    }

    pub fn check(mut self, kind: EntityKind, id: Uuid, expected_version: i64) -> Self {
        self.writes.push(Write::Check {
            kind,
            id,
            expected_version,
        });
        self
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn driver(&self, id: Uuid) -> AppResult<Option<Driver>>;
    async fn trip(&self, id: Uuid) -> AppResult<Option<Trip>>;
    async fn maintenance(&self, id: Uuid) -> AppResult<Option<Maintenance>>;
    async fn expense(&self, id: Uuid) -> AppResult<Option<Expense>>;

    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>>;
    async fn list_drivers(&self, filters: &DriverFilters) -> AppResult<Vec<Driver>>;
    async fn list_trips(&self, filters: &TripFilters) -> AppResult<Vec<Trip>>;
    async fn list_maintenance(&self, filters: &MaintenanceFilters) -> AppResult<Vec<Maintenance>>;
    async fn list_expenses(&self, filters: &ExpenseFilters) -> AppResult<Vec<Expense>>;

    /// Maintenance records for the vehicle that are not yet completed
    async fn open_maintenance_count(&self, vehicle_id: Uuid) -> AppResult<i64>;

    /// Trips, maintenance records and expenses pointing at a vehicle or driver
    async fn reference_count(&self, kind: EntityKind, id: Uuid) -> AppResult<i64>;

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn insert_user(&self, user: User) -> AppResult<()>;

    /// Apply every write or none of them
    async fn commit(&self, changes: ChangeSet) -> AppResult<()>;
}
