use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Vehicle, VehicleFilters};

pub struct VehicleRepository;

impl VehicleRepository {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Vehicle>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, filters: &VehicleFilters) -> Result<Vec<Vehicle>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::vehicle_status IS NULL OR status = $1)
              AND ($2::vehicle_type IS NULL OR vehicle_type = $2)
              AND ($3::text IS NULL OR region = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.status)
        .bind(filters.vehicle_type)
        .bind(filters.region.as_deref())
        .fetch_all(pool)
        .await
    }

    pub async fn insert(conn: &mut PgConnection, vehicle: &Vehicle) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, name, model, license_plate, vehicle_type, max_capacity, odometer,
                                  region, acquisition_cost, status, active_trip_id, open_maintenance,
                                  version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.name)
        .bind(&vehicle.model)
        .bind(&vehicle.license_plate)
        .bind(vehicle.vehicle_type)
        .bind(vehicle.max_capacity)
        .bind(vehicle.odometer)
        .bind(vehicle.region.as_deref())
        .bind(vehicle.acquisition_cost)
        .bind(vehicle.status)
        .bind(vehicle.active_trip_id)
        .bind(vehicle.open_maintenance)
        .bind(vehicle.version)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Returns false when the row is gone or no longer at `expected_version`
    pub async fn update(
        conn: &mut PgConnection,
        vehicle: &Vehicle,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET name = $3, model = $4, license_plate = $5, vehicle_type = $6, max_capacity = $7,
                odometer = $8, region = $9, acquisition_cost = $10, status = $11,
                active_trip_id = $12, open_maintenance = $13, version = $14, updated_at = $15
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(vehicle.id)
        .bind(expected_version)
        .bind(&vehicle.name)
        .bind(&vehicle.model)
        .bind(&vehicle.license_plate)
        .bind(vehicle.vehicle_type)
        .bind(vehicle.max_capacity)
        .bind(vehicle.odometer)
        .bind(vehicle.region.as_deref())
        .bind(vehicle.acquisition_cost)
        .bind(vehicle.status)
        .bind(vehicle.active_trip_id)
        .bind(vehicle.open_maintenance)
        .bind(vehicle.version)
        .bind(vehicle.updated_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn reference_count(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT (SELECT COUNT(*) FROM trips WHERE vehicle_id = $1)
                 + (SELECT COUNT(*) FROM maintenance WHERE vehicle_id = $1)
                 + (SELECT COUNT(*) FROM expenses WHERE vehicle_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}
