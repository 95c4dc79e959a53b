//! HTTP middleware: JWT authentication, role gates and CORS.

pub mod auth;
pub mod cors;

pub use auth::{auth_middleware, require_roles, AuthenticatedUser};
pub use cors::cors_layer;
