use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// Coarse-grained capabilities business operations declare as requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    // Platform-level
    ManagePlatform,
    ManageCondominiums,

    // User management
    ManageUsers,
    ApproveResidents,

    // Complaints
    ManageComplaints,
    RespondComplaints,
    ViewComplaints,
    CreateComplaint,

    // Parcels
    ManageParcels,
    ViewOwnParcels,

    // Announcements
    ManageAnnouncements,

    // Financial
    ViewFinancials,

    // Documents
    ManageDocuments,
    ViewDocuments,

    // Dashboard
    ViewDashboard,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManagePlatform => "MANAGE_PLATFORM",
            Permission::ManageCondominiums => "MANAGE_CONDOMINIUMS",
            Permission::ManageUsers => "MANAGE_USERS",
            Permission::ApproveResidents => "APPROVE_RESIDENTS",
            Permission::ManageComplaints => "MANAGE_COMPLAINTS",
            Permission::RespondComplaints => "RESPOND_COMPLAINTS",
            Permission::ViewComplaints => "VIEW_COMPLAINTS",
            Permission::CreateComplaint => "CREATE_COMPLAINT",
            Permission::ManageParcels => "MANAGE_PARCELS",
            Permission::ViewOwnParcels => "VIEW_OWN_PARCELS",
            Permission::ManageAnnouncements => "MANAGE_ANNOUNCEMENTS",
            Permission::ViewFinancials => "VIEW_FINANCIALS",
            Permission::ManageDocuments => "MANAGE_DOCUMENTS",
            Permission::ViewDocuments => "VIEW_DOCUMENTS",
            Permission::ViewDashboard => "VIEW_DASHBOARD",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission '{0}'")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "MANAGE_PLATFORM" => Ok(Permission::ManagePlatform),
            "MANAGE_CONDOMINIUMS" => Ok(Permission::ManageCondominiums),
            "MANAGE_USERS" => Ok(Permission::ManageUsers),
            "APPROVE_RESIDENTS" => Ok(Permission::ApproveResidents),
            "MANAGE_COMPLAINTS" => Ok(Permission::ManageComplaints),
            "RESPOND_COMPLAINTS" => Ok(Permission::RespondComplaints),
            "VIEW_COMPLAINTS" => Ok(Permission::ViewComplaints),
            "CREATE_COMPLAINT" => Ok(Permission::CreateComplaint),
            "MANAGE_PARCELS" => Ok(Permission::ManageParcels),
            "VIEW_OWN_PARCELS" => Ok(Permission::ViewOwnParcels),
            "MANAGE_ANNOUNCEMENTS" => Ok(Permission::ManageAnnouncements),
            "VIEW_FINANCIALS" => Ok(Permission::ViewFinancials),
            "MANAGE_DOCUMENTS" => Ok(Permission::ManageDocuments),
            "VIEW_DOCUMENTS" => Ok(Permission::ViewDocuments),
            "VIEW_DASHBOARD" => Ok(Permission::ViewDashboard),
            other => Err(UnknownPermission(other.to_string())),
        }
    }
}

impl Role {
    /// Permissions granted by holding this role. Used when claims are minted;
    /// authorization afterwards reads only the claims.
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::OwnerManager => &[
                ManageUsers,
                ApproveResidents,
                ManageComplaints,
                RespondComplaints,
                ViewComplaints,
                ManageParcels,
                ManageAnnouncements,
                ViewFinancials,
                ManageDocuments,
                ViewDocuments,
                ViewDashboard,
            ],
            Role::AssistantManager => &[
                ApproveResidents,
                RespondComplaints,
                ViewComplaints,
                ManageParcels,
                ManageAnnouncements,
                ViewDocuments,
                ViewDashboard,
            ],
            Role::CouncilMember => &[
                ViewComplaints,
                ViewFinancials,
                ViewDocuments,
                ViewDashboard,
            ],
            Role::Gatekeeper => &[ManageParcels, ViewDashboard],
            Role::Maintenance => &[ViewComplaints, ViewDashboard],
            Role::Cleaning => &[ViewDashboard],
            Role::Resident => &[
                CreateComplaint,
                ViewOwnParcels,
                ViewDocuments,
                ViewDashboard,
            ],
            // Platform admins bypass permission checks entirely; the list is
            // still populated so claims stay self-describing.
            Role::PlatformAdmin => &[ManagePlatform, ManageCondominiums],
        }
    }
}
