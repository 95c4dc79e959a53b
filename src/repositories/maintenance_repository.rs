use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Maintenance, MaintenanceFilters};

pub struct MaintenanceRepository;

impl MaintenanceRepository {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Maintenance>, sqlx::Error> {
        sqlx::query_as::<_, Maintenance>("SELECT * FROM maintenance WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filters: &MaintenanceFilters,
    ) -> Result<Vec<Maintenance>, sqlx::Error> {
        sqlx::query_as::<_, Maintenance>(
            r#"
            SELECT * FROM maintenance
            WHERE ($1::uuid IS NULL OR vehicle_id = $1)
              AND ($2::maintenance_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.vehicle_id)
        .bind(filters.status)
        .fetch_all(pool)
        .await
    }

    pub async fn insert(conn: &mut PgConnection, record: &Maintenance) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO maintenance (id, vehicle_id, service_type, description, cost, service_date,
                                     next_due_date, status, completed_at, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.id)
        .bind(record.vehicle_id)
        .bind(&record.service_type)
        .bind(record.description.as_deref())
        .bind(record.cost)
        .bind(record.service_date)
        .bind(record.next_due_date)
        .bind(record.status)
        .bind(record.completed_at)
        .bind(record.version)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn update(
        conn: &mut PgConnection,
        record: &Maintenance,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE maintenance
            SET service_type = $3, description = $4, cost = $5, service_date = $6,
                next_due_date = $7, status = $8, completed_at = $9, version = $10, updated_at = $11
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(record.id)
        .bind(expected_version)
        .bind(&record.service_type)
        .bind(record.description.as_deref())
        .bind(record.cost)
        .bind(record.service_date)
        .bind(record.next_due_date)
        .bind(record.status)
        .bind(record.completed_at)
        .bind(record.version)
        .bind(record.updated_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn open_for_vehicle(pool: &PgPool, vehicle_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM maintenance WHERE vehicle_id = $1 AND status = 'In Progress'",
        )
        .bind(vehicle_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
