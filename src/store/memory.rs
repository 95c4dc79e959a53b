//! In-memory entity store
//!
//! Same commit semantics as Postgres: version checks, unique plates, one
//! active trip per vehicle and driver, and restrictive references. A commit
//! works on a copy of the tables and swaps it in only when every write passed.
//!
//! Fault hooks (failed commits, interfering writers, latency) are compiled in
//! for unit tests and behind the `test-util` feature.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ChangeSet, EntityKind, EntityStore, Record, Write};
use crate::models::{
    Driver, DriverFilters, Expense, ExpenseFilters, Maintenance, MaintenanceFilters, Trip,
    TripFilters, User, Vehicle, VehicleFilters,
};
use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct Tables {
    vehicles: HashMap<Uuid, Vehicle>,
    drivers: HashMap<Uuid, Driver>,
    trips: HashMap<Uuid, Trip>,
    maintenance: HashMap<Uuid, Maintenance>,
    expenses: HashMap<Uuid, Expense>,
    users: HashMap<Uuid, User>,
}

impl Tables {
    fn version_of(&self, kind: EntityKind, id: Uuid) -> Option<i64> {
        match kind {
            EntityKind::Vehicle => self.vehicles.get(&id).map(|r| r.version),
            EntityKind::Driver => self.drivers.get(&id).map(|r| r.version),
            EntityKind::Trip => self.trips.get(&id).map(|r| r.version),
            EntityKind::Maintenance => self.maintenance.get(&id).map(|r| r.version),
            EntityKind::Expense => self.expenses.get(&id).map(|r| r.version),
        }
    }

    fn bump_version(&mut self, kind: EntityKind, id: Uuid) {
        match kind {
            EntityKind::Vehicle => self.vehicles.get_mut(&id).map(|r| r.version += 1),
            EntityKind::Driver => self.drivers.get_mut(&id).map(|r| r.version += 1),
            EntityKind::Trip => self.trips.get_mut(&id).map(|r| r.version += 1),
            EntityKind::Maintenance => self.maintenance.get_mut(&id).map(|r| r.version += 1),
            EntityKind::Expense => self.expenses.get_mut(&id).map(|r| r.version += 1),
        };
    }

    fn references(&self, kind: EntityKind, id: Uuid) -> i64 {
        let count = match kind {
            EntityKind::Vehicle => {
                self.trips.values().filter(|t| t.vehicle_id == id).count()
                    + self.maintenance.values().filter(|m| m.vehicle_id == id).count()
                    + self.expenses.values().filter(|e| e.vehicle_id == id).count()
            }
            EntityKind::Driver => self.trips.values().filter(|t| t.driver_id == id).count(),
            EntityKind::Trip => self.expenses.values().filter(|e| e.trip_id == Some(id)).count(),
            EntityKind::Maintenance | EntityKind::Expense => 0,
        };
        count as i64
    }

    fn expect_version(&self, kind: EntityKind, id: Uuid, expected: i64) -> AppResult<()> {
        match self.version_of(kind, id) {
            Some(current) if current == expected => Ok(()),
            Some(current) => Err(AppError::StaleWrite(format!(
                "{} {} is at version {}, expected {}",
                kind, id, current, expected
            ))),
            None => Err(AppError::StaleWrite(format!("{} {} no longer exists", kind, id))),
        }
    }

    fn check_constraints(&self, record: &Record) -> AppResult<()> {
        match record {
            Record::Vehicle(vehicle) => {
                let duplicate = self.vehicles.values().any(|v| {
                    v.id != vehicle.id && v.license_plate.eq_ignore_ascii_case(&vehicle.license_plate)
                });
                if duplicate {
                    return Err(AppError::Conflict(format!(
                        "License plate '{}' is already registered",
                        vehicle.license_plate
                    )));
                }
            }
            Record::Trip(trip) => {
                if !self.vehicles.contains_key(&trip.vehicle_id) || !self.drivers.contains_key(&trip.driver_id) {
                    return Err(AppError::Conflict("Trip references a missing vehicle or driver".into()));
                }
                if trip.status.is_active() {
                    let busy = self.trips.values().any(|t| {
                        t.id != trip.id
                            && t.status.is_active()
                            && (t.vehicle_id == trip.vehicle_id || t.driver_id == trip.driver_id)
                    });
                    if busy {
                        return Err(AppError::Conflict(
                            "Vehicle or driver already has an active trip".into(),
                        ));
                    }
                }
            }
            Record::Maintenance(record) => {
                if !self.vehicles.contains_key(&record.vehicle_id) {
                    return Err(AppError::Conflict("Maintenance references a missing vehicle".into()));
                }
            }
            Record::Expense(expense) => {
                let trip_missing = expense.trip_id.map_or(false, |id| !self.trips.contains_key(&id));
                if !self.vehicles.contains_key(&expense.vehicle_id) || trip_missing {
                    return Err(AppError::Conflict("Expense references a missing vehicle or trip".into()));
                }
            }
            Record::Driver(_) => {}
        }
        Ok(())
    }

    fn put(&mut self, record: Record) {
        match record {
            Record::Vehicle(v) => {
                self.vehicles.insert(v.id, v);
            }
            Record::Driver(d) => {
                self.drivers.insert(d.id, d);
            }
            Record::Trip(t) => {
                self.trips.insert(t.id, t);
            }
            Record::Maintenance(m) => {
                self.maintenance.insert(m.id, m);
            }
            Record::Expense(e) => {
                self.expenses.insert(e.id, e);
            }
        }
    }

    fn remove(&mut self, kind: EntityKind, id: Uuid) {
        match kind {
            EntityKind::Vehicle => {
                self.vehicles.remove(&id);
            }
            EntityKind::Driver => {
                self.drivers.remove(&id);
            }
            EntityKind::Trip => {
                self.trips.remove(&id);
            }
            EntityKind::Maintenance => {
                self.maintenance.remove(&id);
            }
            EntityKind::Expense => {
                self.expenses.remove(&id);
            }
        }
    }

    fn apply(&mut self, write: Write) -> AppResult<()> {
        match write {
            Write::Insert(record) => {
                if self.version_of(record.kind(), record.id()).is_some() {
                    return Err(AppError::Conflict(format!(
                        "{} {} already exists",
                        record.kind(),
                        record.id()
                    )));
                }
                self.check_constraints(&record)?;
                self.put(record);
            }
            Write::Update {
                record,
                expected_version,
            } => {
                if let Record::Expense(expense) = &record {
                    return Err(AppError::Conflict(format!(
                        "Expense {} cannot be edited, delete it and record it again",
                        expense.id
                    )));
                }
                self.expect_version(record.kind(), record.id(), expected_version)?;
                self.check_constraints(&record)?;
                self.put(record);
            }
            Write::Delete {
                kind,
                id,
                expected_version,
            } => {
                self.expect_version(kind, id, expected_version)?;
                if self.references(kind, id) > 0 {
                    return Err(AppError::Conflict(format!("{} {} is still referenced", kind, id)));
                }
                self.remove(kind, id);
            }
            Write::Check {
                kind,
                id,
                expected_version,
            } => self.expect_version(kind, id, expected_version)?,
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Faults {
    failing_commits: usize,
    interference: Vec<(EntityKind, Uuid)>,
    latency: Option<Duration>,
}

/// Entity store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    faults: Mutex<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` commits fail as if the database went away
    #[cfg(any(test, feature = "test-util"))]
    pub fn fail_next_commits(&self, count: usize) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.failing_commits = count;
        }
    }

    /// Simulate a concurrent writer touching a record right before the next commit
    #[cfg(any(test, feature = "test-util"))]
    pub fn interfere_before_next_commit(&self, kind: EntityKind, id: Uuid) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.interference.push((kind, id));
        }
    }

    /// Delay every call, to exercise timeouts
    #[cfg(any(test, feature = "test-util"))]
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.latency = latency;
        }
    }

    async fn simulate_latency(&self) {
        let latency = self.faults.lock().ok().and_then(|f| f.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn take_commit_faults(&self) -> (bool, Vec<(EntityKind, Uuid)>) {
        match self.faults.lock() {
            Ok(mut faults) => {
                let fail = faults.failing_commits > 0;
                if fail {
                    faults.failing_commits -= 1;
                }
                (fail, std::mem::take(&mut faults.interference))
            }
            Err(_) => (false, Vec::new()),
        }
    }
}

fn newest_first<T, F>(mut records: Vec<T>, created: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    records.sort_by(|a, b| created(b).cmp(&created(a)));
    records
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        self.simulate_latency().await;
        Ok(self.tables.read().await.vehicles.get(&id).cloned())
    }

    async fn driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        self.simulate_latency().await;
        Ok(self.tables.read().await.drivers.get(&id).cloned())
    }

    async fn trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        self.simulate_latency().await;
        Ok(self.tables.read().await.trips.get(&id).cloned())
    }

    async fn maintenance(&self, id: Uuid) -> AppResult<Option<Maintenance>> {
        self.simulate_latency().await;
        Ok(self.tables.read().await.maintenance.get(&id).cloned())
    }

    async fn expense(&self, id: Uuid) -> AppResult<Option<Expense>> {
        self.simulate_latency().await;
        Ok(self.tables.read().await.expenses.get(&id).cloned())
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;
        let rows = tables.vehicles.values().filter(|v| filters.matches(v)).cloned().collect();
        Ok(newest_first(rows, |v: &Vehicle| v.created_at))
    }

    async fn list_drivers(&self, filters: &DriverFilters) -> AppResult<Vec<Driver>> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;
        let rows = tables.drivers.values().filter(|d| filters.matches(d)).cloned().collect();
        Ok(newest_first(rows, |d: &Driver| d.created_at))
    }

    async fn list_trips(&self, filters: &TripFilters) -> AppResult<Vec<Trip>> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;
        let rows = tables.trips.values().filter(|t| filters.matches(t)).cloned().collect();
        Ok(newest_first(rows, |t: &Trip| t.created_at))
    }

    async fn list_maintenance(&self, filters: &MaintenanceFilters) -> AppResult<Vec<Maintenance>> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;
        let rows = tables.maintenance.values().filter(|m| filters.matches(m)).cloned().collect();
        Ok(newest_first(rows, |m: &Maintenance| m.created_at))
    }

    async fn list_expenses(&self, filters: &ExpenseFilters) -> AppResult<Vec<Expense>> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;
        let rows = tables.expenses.values().filter(|e| filters.matches(e)).cloned().collect();
        Ok(newest_first(rows, |e: &Expense| e.created_at))
    }

    async fn open_maintenance_count(&self, vehicle_id: Uuid) -> AppResult<i64> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;
        let open = tables
            .maintenance
            .values()
            .filter(|m| m.vehicle_id == vehicle_id && m.status.is_open())
            .count();
        Ok(open as i64)
    }

    async fn reference_count(&self, kind: EntityKind, id: Uuid) -> AppResult<i64> {
        self.simulate_latency().await;
        Ok(self.tables.read().await.references(kind, id))
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.simulate_latency().await;
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_user(&self, user: User) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::Conflict(format!("User '{}' already exists", user.email)));
        }
        tables.users.insert(user.id, user);
        Ok(())
    }

    async fn commit(&self, changes: ChangeSet) -> AppResult<()> {
        self.simulate_latency().await;
        let (fail, interference) = self.take_commit_faults();
        let mut tables = self.tables.write().await;

        for (kind, id) in interference {
            tables.bump_version(kind, id);
        }
        if fail {
            return Err(AppError::Dependency("entity store connection lost during commit".into()));
        }

        let mut staged = tables.clone();
        for write in changes.into_writes() {
            staged.apply(write)?;
        }
        *tables = staged;
        Ok(())
    }
}
