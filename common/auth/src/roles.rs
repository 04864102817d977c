use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Roles a user can hold inside a condominium, plus the platform-wide
/// administrator role that only ever appears in token claims (it is derived
/// from a user flag, never stored in a role binding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    OwnerManager,
    AssistantManager,
    CouncilMember,
    Gatekeeper,
    Maintenance,
    Cleaning,
    Resident,
    PlatformAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::OwnerManager => "OWNER_MANAGER",
            Role::AssistantManager => "ASSISTANT_MANAGER",
            Role::CouncilMember => "COUNCIL_MEMBER",
            Role::Gatekeeper => "GATEKEEPER",
            Role::Maintenance => "MAINTENANCE",
            Role::Cleaning => "CLEANING",
            Role::Resident => "RESIDENT",
            Role::PlatformAdmin => "PLATFORM_ADMIN",
        }
    }

    /// The binding roles, i.e. every role that may appear on a
    /// condominium role binding. Excludes `PlatformAdmin`.
    pub fn binding_roles() -> &'static [Role] {
        &[
            Role::OwnerManager,
            Role::AssistantManager,
            Role::CouncilMember,
            Role::Gatekeeper,
            Role::Maintenance,
            Role::Cleaning,
            Role::Resident,
        ]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "OWNER_MANAGER" => Ok(Role::OwnerManager),
            "ASSISTANT_MANAGER" => Ok(Role::AssistantManager),
            "COUNCIL_MEMBER" => Ok(Role::CouncilMember),
            "GATEKEEPER" => Ok(Role::Gatekeeper),
            "MAINTENANCE" => Ok(Role::Maintenance),
            "CLEANING" => Ok(Role::Cleaning),
            "RESIDENT" => Ok(Role::Resident),
            "PLATFORM_ADMIN" => Ok(Role::PlatformAdmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Approval state of a role binding. Only `Active` bindings count toward a
/// user's effective roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BindingStatus {
    PendingApproval,
    Active,
    Rejected,
}

impl BindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingStatus::PendingApproval => "PENDING_APPROVAL",
            BindingStatus::Active => "ACTIVE",
            BindingStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for BindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown binding status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for BindingStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PENDING_APPROVAL" => Ok(BindingStatus::PendingApproval),
            "ACTIVE" => Ok(BindingStatus::Active),
            "REJECTED" => Ok(BindingStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
