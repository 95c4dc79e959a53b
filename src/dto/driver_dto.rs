use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::models::{DriverStatus, VehicleType};
use crate::utils::validation::{not_blank, PHONE_RE};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(length(max = 100), custom = "not_blank")]
    pub name: String,
    #[validate(regex(path = "PHONE_RE", message = "Invalid phone number"))]
    pub phone: String,
    /// Empty means the license is not restricted to vehicle types
    #[serde(default)]
    pub license_categories: Vec<VehicleType>,
    pub license_expiry: NaiveDate,
    #[validate(range(min = 0, max = 100))]
    pub safety_score: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateDriverRequest {
    #[validate(length(max = 100), custom = "not_blank")]
    pub name: Option<String>,
    #[validate(regex(path = "PHONE_RE", message = "Invalid phone number"))]
    pub phone: Option<String>,
    pub license_categories: Option<Vec<VehicleType>>,
    pub license_expiry: Option<NaiveDate>,
    #[validate(range(min = 0, max = 100))]
    pub safety_score: Option<i32>,
    /// `On Duty` or `Suspended`
    pub status: Option<DriverStatus>,
}
