use serde::Serialize;

use super::users::Role;

/// Actions gated by role. Ownership of a shift is checked separately by the workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    BrowseShifts,
    Volunteer,
    PostShifts,
    ManageAnyShift,
    ReviewApplications,
    ViewReports,
    ViewAllRecords,
    ViewAuditLog,
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::BrowseShifts,
    Permission::PostShifts,
    Permission::ManageAnyShift,
    Permission::ReviewApplications,
    Permission::ViewReports,
    Permission::ViewAllRecords,
    Permission::ViewAuditLog,
];

const MANAGER_PERMISSIONS: &[Permission] = &[
    Permission::BrowseShifts,
    Permission::PostShifts,
    Permission::ReviewApplications,
    Permission::ViewReports,
];

const STAFF_PERMISSIONS: &[Permission] = &[Permission::BrowseShifts, Permission::Volunteer];

impl Role {
    pub const fn permissions(self) -> &'static [Permission] {
        match self {
            Self::Admin => ADMIN_PERMISSIONS,
            Self::Manager => MANAGER_PERMISSIONS,
            Self::Staff => STAFF_PERMISSIONS,
        }
    }

    pub fn permits(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}
