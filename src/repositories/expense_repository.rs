use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Expense, ExpenseFilters};

pub struct ExpenseRepository;

impl ExpenseRepository {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Expense>, sqlx::Error> {
        sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, filters: &ExpenseFilters) -> Result<Vec<Expense>, sqlx::Error> {
        sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses
            WHERE ($1::uuid IS NULL OR vehicle_id = $1)
              AND ($2::uuid IS NULL OR trip_id = $2)
              AND ($3::expense_type IS NULL OR expense_type = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filters.vehicle_id)
        .bind(filters.trip_id)
        .bind(filters.expense_type)
        .fetch_all(pool)
        .await
    }

    pub async fn insert(conn: &mut PgConnection, expense: &Expense) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO expenses (id, vehicle_id, trip_id, expense_type, cost, liters, date, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(expense.id)
        .bind(expense.vehicle_id)
        .bind(expense.trip_id)
        .bind(expense.expense_type)
        .bind(expense.cost)
        .bind(expense.liters)
        .bind(expense.date)
        .bind(expense.version)
        .bind(expense.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }
}
