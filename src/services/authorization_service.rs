//! Authorization gate
//!
//! Role sets required by each group of operations. Reads only need an
//! authenticated caller; writes check the caller's role first.

use tracing::warn;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::UserRole;
use crate::utils::errors::AppError;

/// Trip and maintenance lifecycle calls, vehicle and driver records
pub const FLEET_MANAGERS: &[UserRole] = &[UserRole::Manager, UserRole::Admin];

/// Driver profile edits (safety scores, suspensions)
pub const DRIVER_EDITORS: &[UserRole] = &[UserRole::Manager, UserRole::Admin, UserRole::SafetyOfficer];

pub const EXPENSE_WRITERS: &[UserRole] = &[
    UserRole::Manager,
    UserRole::Admin,
    UserRole::FinancialAnalyst,
];

pub fn is_allowed(role: UserRole, required_roles: &[UserRole]) -> bool {
    required_roles.contains(&role)
}

/// Deny short-circuits the request before anything is written
pub fn authorize(user: &AuthenticatedUser, required_roles: &[UserRole]) -> Result<(), AppError> {
    if is_allowed(user.role, required_roles) {
        return Ok(());
    }

    warn!(
        "🚫 {} ({}) denied, requires one of {:?}",
        user.email, user.role, required_roles
    );
    Err(AppError::Forbidden(format!(
        "Role '{}' is not allowed to perform this action",
        user.role
    )))
}
