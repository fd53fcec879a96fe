use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Full access, including settings, users and access control.
    Administrator,
    /// Reports and HR approvals.
    Manager,
    /// Quotes, emails and the time clock.
    Operator,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema, Display, EnumIter, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    // CRM
    ViewDashboard,
    ViewQuotes,
    EditQuotes,
    ViewSales,
    ViewCustomers,
    ViewEmails,
    // HR
    ViewTimeclock,
    ViewAttendance,
    ManageAbsences,
    ManageVacations,
    // System
    ManageSettings,
    ManageUsers,
    ManageAcl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoleAccess {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// Pure lookup: a role without an entry in the table has no permissions.
pub fn has_permission(role: Role, permission: Permission, table: &[RoleAccess]) -> bool {
    table
        .iter()
        .find(|entry| entry.role == role)
        .map(|entry| entry.permissions.contains(&permission))
        .unwrap_or(false)
}

pub fn default_access_table() -> Vec<RoleAccess> {
    use Permission::*;

    vec![
        RoleAccess {
            role: Role::Administrator,
            permissions: Permission::iter().collect(),
        },
        RoleAccess {
            role: Role::Manager,
            permissions: vec![
                ViewDashboard,
                ViewQuotes,
                EditQuotes,
                ViewSales,
                ViewCustomers,
                ViewAttendance,
                ManageAbsences,
                ManageVacations,
                ViewEmails,
            ],
        },
        RoleAccess {
            role: Role::Operator,
            permissions: vec![ViewQuotes, EditQuotes, ViewTimeclock, ViewEmails],
        },
    ]
}
