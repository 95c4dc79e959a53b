//! Fleet operations backend
//!
//! Vehicles, drivers, trips, maintenance and expenses behind a JWT-protected
//! REST API. Trip and maintenance lifecycles keep vehicle and driver
//! availability consistent through atomic, versioned commits.

pub mod config;
pub mod controllers;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
