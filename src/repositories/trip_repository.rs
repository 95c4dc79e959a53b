use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Trip, TripFilters};

pub struct TripRepository;

impl TripRepository {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, filters: &TripFilters) -> Result<Vec<Trip>, sqlx::Error> {
        sqlx::query_as::<_, Trip>(
            r#"
            SELECT * FROM trips
            WHERE ($1::trip_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR vehicle_id = $2)
              AND ($3::uuid IS NULL OR driver_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.status)
        .bind(filters.vehicle_id)
        .bind(filters.driver_id)
        .fetch_all(pool)
        .await
    }

    pub async fn insert(conn: &mut PgConnection, trip: &Trip) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO trips (id, vehicle_id, driver_id, origin, destination, cargo_weight, revenue,
                               start_odometer, end_odometer, status, start_date, dispatched_at,
                               end_date, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(trip.id)
        .bind(trip.vehicle_id)
        .bind(trip.driver_id)
        .bind(&trip.origin)
        .bind(&trip.destination)
        .bind(trip.cargo_weight)
        .bind(trip.revenue)
        .bind(trip.start_odometer)
        .bind(trip.end_odometer)
        .bind(trip.status)
        .bind(trip.start_date)
        .bind(trip.dispatched_at)
        .bind(trip.end_date)
        .bind(trip.version)
        .bind(trip.created_at)
        .bind(trip.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn update(
        conn: &mut PgConnection,
        trip: &Trip,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE trips
            SET origin = $3, destination = $4, cargo_weight = $5, revenue = $6,
                start_odometer = $7, end_odometer = $8, status = $9, dispatched_at = $10,
                end_date = $11, version = $12, updated_at = $13
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(trip.id)
        .bind(expected_version)
        .bind(&trip.origin)
        .bind(&trip.destination)
        .bind(trip.cargo_weight)
        .bind(trip.revenue)
        .bind(trip.start_odometer)
        .bind(trip.end_odometer)
        .bind(trip.status)
        .bind(trip.dispatched_at)
        .bind(trip.end_date)
        .bind(trip.version)
        .bind(trip.updated_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn reference_count(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM expenses WHERE trip_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
