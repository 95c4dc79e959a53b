//! Controllers orchestrate reads, domain rules and atomic commits for each
//! resource. They are transport agnostic and only see a [`StoreGateway`].
//!
//! [`StoreGateway`]: crate::store::StoreGateway

pub mod driver_controller;
pub mod expense_controller;
pub mod maintenance_controller;
pub mod trip_controller;
pub mod vehicle_controller;

#[cfg(test)]
pub(crate) mod fixtures;
