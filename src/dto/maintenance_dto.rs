use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::MaintenanceStatus;
use crate::utils::validation::{non_negative_decimal, not_blank};

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_due_date", skip_on_field_errors = false))]
pub struct CreateMaintenanceRequest {
    pub vehicle_id: Uuid,
    #[validate(length(max = 100), custom = "not_blank")]
    pub service_type: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom = "non_negative_decimal")]
    pub cost: Option<Decimal>,
    pub service_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
    /// Defaults to `In Progress`. `Completed` logs past work without
    /// touching the vehicle.
    pub status: Option<MaintenanceStatus>,
}

fn validate_due_date(request: &CreateMaintenanceRequest) -> Result<(), ValidationError> {
    if let (Some(service), Some(due)) = (request.service_date, request.next_due_date) {
        if due < service {
            return Err(ValidationError::new("next_due_date_before_service_date"));
        }
    }
    Ok(())
}
