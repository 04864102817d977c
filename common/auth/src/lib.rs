pub mod claims;
pub mod error;
pub mod gate;
pub mod identity;
pub mod permission;
pub mod roles;
pub mod tenant;
pub mod token;

pub use claims::{AccessClaims, RefreshClaims};
pub use error::{reject, ApiErrorBody, AuthError, AuthResult, ConfigError, TokenError};
pub use gate::{ensure_any_role, ensure_permission, GateError};
pub use identity::{resolve_identity, Identity, MaybeIdentity};
pub use permission::Permission;
pub use roles::{BindingStatus, Role};
pub use tenant::{
    condominium_id_from_path, enforce_tenant_boundary, DirectoryError, SharedTenantDirectory,
    TenantContext, TenantDirectory, TenantNotBound, TenantStatus,
};
pub use token::{IssuedToken, TokenService};
