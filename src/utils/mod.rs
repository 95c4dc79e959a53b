//! Shared utilities: errors, validation, JWT and request extractors.

pub mod errors;
pub mod extractors;
pub mod jwt;
pub mod validation;
