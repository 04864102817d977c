use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

use crate::error::reject;
use crate::identity::Identity;
use crate::permission::Permission;
use crate::roles::Role;

/// Authorization failure: the caller is authenticated but lacks privilege.
/// Deliberately distinct from the 401 family — the two are never collapsed.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("insufficient privilege; required one of: {}", required.join(", "))]
    Forbidden { required: Vec<&'static str> },
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        reject(StatusCode::FORBIDDEN, "ACCESS_DENIED", self.to_string())
    }
}

/// Declarative per-operation check, called at the top of each business
/// operation. Satisfied when the identity is a platform administrator, holds
/// the permission in its claims, or holds a role that grants it. Takes an
/// already-resolved [`Identity`], so unauthenticated callers can never reach
/// this point — they fail earlier with 401.
pub fn ensure_permission(identity: &Identity, permission: Permission) -> Result<(), GateError> {
    if identity.is_platform_admin() {
        return Ok(());
    }
    if identity.has_permission(permission)
        || identity
            .roles
            .iter()
            .any(|role| role.permissions().contains(&permission))
    {
        return Ok(());
    }

    warn!(
        subject = %identity.subject,
        required = permission.as_str(),
        roles = ?identity.roles,
        "permission check failed"
    );
    Err(GateError::Forbidden {
        required: vec![permission.as_str()],
    })
}

/// Role-list variant for operations declared in terms of roles.
pub fn ensure_any_role(identity: &Identity, required: &[Role]) -> Result<(), GateError> {
    if identity.is_platform_admin() {
        return Ok(());
    }
    if identity.roles.iter().any(|role| required.contains(role)) {
        return Ok(());
    }

    warn!(
        subject = %identity.subject,
        required = ?required,
        roles = ?identity.roles,
        "role check failed"
    );
    Err(GateError::Forbidden {
        required: required.iter().map(Role::as_str).collect(),
    })
}
