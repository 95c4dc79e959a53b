//! Postgres queries, one repository per table.
//!
//! Reads go through the pool; writes take a connection so the store can run
//! a whole change set inside one transaction.

pub mod driver_repository;
pub mod expense_repository;
pub mod maintenance_repository;
pub mod trip_repository;
pub mod user_repository;
pub mod vehicle_repository;

pub use driver_repository::DriverRepository;
pub use expense_repository::ExpenseRepository;
pub use maintenance_repository::MaintenanceRepository;
pub use trip_repository::TripRepository;
pub use user_repository::UserRepository;
pub use vehicle_repository::VehicleRepository;
