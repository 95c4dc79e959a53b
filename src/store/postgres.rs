//! Postgres entity store
//!
//! A change set runs inside one transaction. Versioned updates that match no
//! row, and checks that find a newer version, abort it with `StaleWrite`;
//! dropping the transaction rolls everything back.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error};
use uuid::Uuid;

use super::{ChangeSet, EntityKind, EntityStore, Record, Write};
use crate::models::{
    Driver, DriverFilters, Expense, ExpenseFilters, Maintenance, MaintenanceFilters, Trip,
    TripFilters, User, Vehicle, VehicleFilters,
};
use crate::repositories::{
    DriverRepository, ExpenseRepository, MaintenanceRepository, TripRepository, UserRepository,
    VehicleRepository,
};
use crate::utils::errors::{AppError, AppResult};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Vehicle => "vehicles",
        EntityKind::Driver => "drivers",
        EntityKind::Trip => "trips",
        EntityKind::Maintenance => "maintenance",
        EntityKind::Expense => "expenses",
    }
}

/// Constraint violations are caller conflicts, everything else is the store failing
fn map_write_error(err: sqlx::Error) -> AppError {
    if let Some(db) = err.as_database_error() {
        let constraint = db.constraint().unwrap_or("unknown").to_string();
        match db.code().as_deref() {
            Some("23505") => {
                return AppError::Conflict(format!("Duplicate value violates '{}'", constraint))
            }
            Some("23503") => {
                return AppError::Conflict(format!(
                    "Record is referenced or references a missing record ('{}')",
                    constraint
                ))
            }
            Some("23514") => {
                return AppError::Conflict(format!("Check constraint '{}' failed", constraint))
            }
            Some("40001") | Some("40P01") => {
                return AppError::StaleWrite("Concurrent transaction touched the same rows".into())
            }
            _ => {}
        }
    }
    error!("Commit failed: {}", err);
    AppError::Database(err)
}

fn stale(kind: EntityKind, id: Uuid, expected_version: i64) -> AppError {
    AppError::StaleWrite(format!(
        "{} {} is no longer at version {}",
        kind, id, expected_version
    ))
}

async fn apply(conn: &mut PgConnection, write: Write) -> AppResult<()> {
    match write {
        Write::Insert(record) => {
            match &record {
                Record::Vehicle(v) => VehicleRepository::insert(conn, v).await,
                Record::Driver(d) => DriverRepository::insert(conn, d).await,
                Record::Trip(t) => TripRepository::insert(conn, t).await,
                Record::Maintenance(m) => MaintenanceRepository::insert(conn, m).await,
                Record::Expense(e) => ExpenseRepository::insert(conn, e).await,
            }
            .map_err(map_write_error)?;
        }
        Write::Update {
            record,
            expected_version,
        } => {
            let matched = match &record {
                Record::Vehicle(v) => VehicleRepository::update(conn, v, expected_version).await,
                Record::Driver(d) => DriverRepository::update(conn, d, expected_version).await,
                Record::Trip(t) => TripRepository::update(conn, t, expected_version).await,
                Record::Maintenance(m) => {
                    MaintenanceRepository::update(conn, m, expected_version).await
                }
                Record::Expense(e) => {
                    return Err(AppError::Conflict(format!(
                        "Expense {} cannot be edited, delete it and record it again",
                        e.id
                    )));
                }
            }
            .map_err(map_write_error)?;

            if !matched {
                return Err(stale(record.kind(), record.id(), expected_version));
            }
        }
        Write::Delete {
            kind,
            id,
            expected_version,
        } => {
            let sql = format!("DELETE FROM {} WHERE id = $1 AND version = $2", table(kind));
            let result = sqlx::query(&sql)
                .bind(id)
                .bind(expected_version)
                .execute(&mut *conn)
                .await
                .map_err(map_write_error)?;

            if result.rows_affected() == 0 {
                return Err(stale(kind, id, expected_version));
            }
        }
        Write::Check {
            kind,
            id,
            expected_version,
        } => {
            let sql = format!("SELECT version FROM {} WHERE id = $1 FOR UPDATE", table(kind));
            let current: Option<(i64,)> = sqlx::query_as(&sql)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(map_write_error)?;

            if current.map(|(version,)| version) != Some(expected_version) {
                return Err(stale(kind, id, expected_version));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl EntityStore for PgStore {
    async fn vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(VehicleRepository::find_by_id(&self.pool, id).await?)
    }

    async fn driver(&self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(DriverRepository::find_by_id(&self.pool, id).await?)
    }

    async fn trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        Ok(TripRepository::find_by_id(&self.pool, id).await?)
    }

    async fn maintenance(&self, id: Uuid) -> AppResult<Option<Maintenance>> {
        Ok(MaintenanceRepository::find_by_id(&self.pool, id).await?)
    }

    async fn expense(&self, id: Uuid) -> AppResult<Option<Expense>> {
        Ok(ExpenseRepository::find_by_id(&self.pool, id).await?)
    }

    async fn list_vehicles(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        Ok(VehicleRepository::list(&self.pool, filters).await?)
    }

    async fn list_drivers(&self, filters: &DriverFilters) -> AppResult<Vec<Driver>> {
        Ok(DriverRepository::list(&self.pool, filters).await?)
    }

    async fn list_trips(&self, filters: &TripFilters) -> AppResult<Vec<Trip>> {
        Ok(TripRepository::list(&self.pool, filters).await?)
    }

    async fn list_maintenance(&self, filters: &MaintenanceFilters) -> AppResult<Vec<Maintenance>> {
        Ok(MaintenanceRepository::list(&self.pool, filters).await?)
    }

    async fn list_expenses(&self, filters: &ExpenseFilters) -> AppResult<Vec<Expense>> {
        Ok(ExpenseRepository::list(&self.pool, filters).await?)
    }

    async fn open_maintenance_count(&self, vehicle_id: Uuid) -> AppResult<i64> {
        Ok(MaintenanceRepository::open_for_vehicle(&self.pool, vehicle_id).await?)
    }

    async fn reference_count(&self, kind: EntityKind, id: Uuid) -> AppResult<i64> {
        let count = match kind {
            EntityKind::Vehicle => VehicleRepository::reference_count(&self.pool, id).await?,
            EntityKind::Driver => DriverRepository::reference_count(&self.pool, id).await?,
            EntityKind::Trip => TripRepository::reference_count(&self.pool, id).await?,
            EntityKind::Maintenance | EntityKind::Expense => 0,
        };
        Ok(count)
    }

    async fn user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(UserRepository::find_by_email(&self.pool, email).await?)
    }

    async fn insert_user(&self, user: User) -> AppResult<()> {
        UserRepository::insert(&self.pool, &user)
            .await
            .map_err(map_write_error)
    }

    async fn commit(&self, changes: ChangeSet) -> AppResult<()> {
        let writes = changes.into_writes();
        let count = writes.len();
        let mut tx = self.pool.begin().await?;

        for write in writes {
            apply(&mut *tx, write).await?;
        }

        tx.commit().await.map_err(map_write_error)?;
        debug!("💾 Committed {} writes", count);
        Ok(())
    }
}
