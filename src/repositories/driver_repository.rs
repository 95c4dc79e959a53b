use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Driver, DriverFilters};

pub struct DriverRepository;

impl DriverRepository {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Driver>, sqlx::Error> {
        sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, filters: &DriverFilters) -> Result<Vec<Driver>, sqlx::Error> {
        sqlx::query_as::<_, Driver>(
            r#"
            SELECT * FROM drivers
            WHERE ($1::driver_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.status)
        .fetch_all(pool)
        .await
    }

    pub async fn insert(conn: &mut PgConnection, driver: &Driver) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO drivers (id, name, phone, license_categories, license_expiry, safety_score,
                                 status, trips_completed, active_trip_id, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(driver.id)
        .bind(&driver.name)
        .bind(&driver.phone)
        .bind(&driver.license_categories)
        .bind(driver.license_expiry)
        .bind(driver.safety_score)
        .bind(driver.status)
        .bind(driver.trips_completed)
        .bind(driver.active_trip_id)
        .bind(driver.version)
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn update(
        conn: &mut PgConnection,
        driver: &Driver,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE drivers
            SET name = $3, phone = $4, license_categories = $5, license_expiry = $6,
                safety_score = $7, status = $8, trips_completed = $9, active_trip_id = $10,
                version = $11, updated_at = $12
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(driver.id)
        .bind(expected_version)
        .bind(&driver.name)
        .bind(&driver.phone)
        .bind(&driver.license_categories)
        .bind(driver.license_expiry)
        .bind(driver.safety_score)
        .bind(driver.status)
        .bind(driver.trips_completed)
        .bind(driver.active_trip_id)
        .bind(driver.version)
        .bind(driver.updated_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn reference_count(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM trips WHERE driver_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
