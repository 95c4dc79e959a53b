//! Services module
//!
//! Domain rules that are shared across controllers: the status model for
//! trips and maintenance, the role gate and authentication.

pub mod auth_service;
pub mod authorization_service;
pub mod status_model;
