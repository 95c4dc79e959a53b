use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::{non_negative_decimal, not_blank, positive_decimal};

/// Body of `POST /api/trips`. Required fields are optional here so that a
/// missing one is reported per field instead of as an unreadable body.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateTripRequest {
    #[validate(required)]
    pub vehicle_id: Option<Uuid>,
    #[validate(required)]
    pub driver_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(max = 200), custom = "not_blank")]
    pub origin: String,
    #[serde(default)]
    #[validate(length(max = 200), custom = "not_blank")]
    pub destination: String,
    #[validate(required, custom = "positive_decimal")]
    pub cargo_weight: Option<Decimal>,
    #[validate(custom = "non_negative_decimal")]
    pub revenue: Option<Decimal>,
    #[validate(required, range(min = 0))]
    pub start_odometer: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CompleteTripRequest {
    #[validate(required, range(min = 0))]
    pub end_odometer: Option<i64>,
}
