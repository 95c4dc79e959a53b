use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::ExpenseType;
use crate::utils::validation::{non_negative_decimal, positive_decimal};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    pub vehicle_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub expense_type: ExpenseType,
    #[validate(custom = "non_negative_decimal")]
    pub cost: Decimal,
    /// Required for `Fuel`, rejected otherwise
    #[validate(custom = "positive_decimal")]
    pub liters: Option<Decimal>,
    pub date: Option<NaiveDate>,
}
