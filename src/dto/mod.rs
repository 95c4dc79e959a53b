pub mod auth_dto;
pub mod driver_dto;
pub mod expense_dto;
pub mod maintenance_dto;
pub mod trip_dto;
pub mod vehicle_dto;

pub use auth_dto::*;
pub use driver_dto::*;
pub use expense_dto::*;
pub use maintenance_dto::*;
pub use trip_dto::*;
pub use vehicle_dto::*;
