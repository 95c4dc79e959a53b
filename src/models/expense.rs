//! Expense model
//!
//! Expenses are immutable once created and carry no status machine.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::trip::Trip;
use super::vehicle::Vehicle;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "expense_type")]
pub enum ExpenseType {
    Fuel,
    Toll,
    Maintenance,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub expense_type: ExpenseType,
    pub cost: Decimal,
    /// Fuel quantity, only for `Fuel`
    pub liters: Option<Decimal>,
    pub date: NaiveDate,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseDetail {
    #[serde(flatten)]
    pub expense: Expense,
    pub vehicle: Option<Vehicle>,
    pub trip: Option<Trip>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseFilters {
    pub vehicle_id: Option<Uuid>,
    pub trip_id: Option<Uuid>,
    pub expense_type: Option<ExpenseType>,
}

impl ExpenseFilters {
    pub fn matches(&self, expense: &Expense) -> bool {
        self.vehicle_id.map_or(true, |id| expense.vehicle_id == id)
            && self.trip_id.map_or(true, |id| expense.trip_id == Some(id))
            && self.expense_type.map_or(true, |t| expense.expense_type == t)
    }
}
