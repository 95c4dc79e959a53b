//! Domain records and their status enums.

pub mod driver;
pub mod expense;
pub mod maintenance;
pub mod trip;
pub mod user;
pub mod vehicle;

pub use driver::{Driver, DriverFilters, DriverStatus};
pub use expense::{Expense, ExpenseDetail, ExpenseFilters, ExpenseType};
pub use maintenance::{Maintenance, MaintenanceDetail, MaintenanceFilters, MaintenanceStatus};
pub use trip::{Trip, TripAction, TripDetail, TripFilters, TripStatus};
pub use user::{User, UserResponse, UserRole};
pub use vehicle::{Vehicle, VehicleFilters, VehicleStatus, VehicleType};
