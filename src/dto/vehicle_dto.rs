use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::VehicleType;
use crate::utils::validation::{non_negative_decimal, not_blank, positive_decimal, LICENSE_PLATE_RE};

// Request to register a vehicle
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(max = 100), custom = "not_blank")]
    pub name: String,
    #[validate(length(max = 100), custom = "not_blank")]
    pub model: String,
    #[validate(regex(path = "LICENSE_PLATE_RE", message = "Invalid license plate"))]
    pub license_plate: String,
    pub vehicle_type: VehicleType,
    #[validate(custom = "positive_decimal")]
    pub max_capacity: Decimal,
    #[validate(range(min = 0))]
    pub odometer: Option<i64>,
    #[validate(length(max = 100))]
    pub region: Option<String>,
    #[validate(custom = "non_negative_decimal")]
    pub acquisition_cost: Option<Decimal>,
}

// Partial update; status is derived and cannot be sent
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateVehicleRequest {
    #[validate(length(max = 100), custom = "not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 100), custom = "not_blank")]
    pub model: Option<String>,
    #[validate(regex(path = "LICENSE_PLATE_RE", message = "Invalid license plate"))]
    pub license_plate: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    #[validate(custom = "positive_decimal")]
    pub max_capacity: Option<Decimal>,
    #[validate(range(min = 0))]
    pub odometer: Option<i64>,
    #[validate(length(max = 100))]
    pub region: Option<String>,
    #[validate(custom = "non_negative_decimal")]
    pub acquisition_cost: Option<Decimal>,
}
