use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::Permission;
use crate::roles::Role;

/// Claims carried by an access token. Entirely self-contained: validity is a
/// signature-plus-expiry question, never a storage lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User public identifier.
    pub sub: Uuid,
    pub email: String,
    /// The condominium this session is scoped to, absent for users with no
    /// active binding (e.g. pure platform admins).
    #[serde(rename = "tenantId", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<i64>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub iat: i64,
    pub exp: i64,
}

/// Minimal claims carried by a refresh token. The ledger row, not these
/// claims, is the authority on whether the token is still usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}
