use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::authz::capabilities::*;
use crate::errors::AppError;

// =============================================================================
// ROLE
// =============================================================================

/// Closed set of staff roles. Each role owns its full capability list in the
/// [`RoleTable`]; there is no inheritance between roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    BranchManager,
    BookingAgent,
    CustomerService,
    MaintenanceStaff,
    Accountant,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::BranchManager,
        Role::BookingAgent,
        Role::CustomerService,
        Role::MaintenanceStaff,
        Role::Accountant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::BranchManager => "branch_manager",
            Role::BookingAgent => "booking_agent",
            Role::CustomerService => "customer_service",
            Role::MaintenanceStaff => "maintenance_staff",
            Role::Accountant => "accountant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| AppError::validation(format!("unknown role: {value}")))
    }
}

// =============================================================================
// ROLE DESCRIPTOR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleInfo {
    pub role: Role,
    pub label: &'static str,
    pub permissions: BTreeSet<&'static str>,
}

impl RoleInfo {
    pub fn new(role: Role, label: &'static str, permissions: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            role,
            label,
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn has_permission(&self, capability: &str) -> bool {
        self.permissions.contains(capability)
    }
}

// =============================================================================
// ROLE TABLE
// =============================================================================

/// Static role -> capability table, fixed for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    roles: HashMap<Role, RoleInfo>,
}

impl RoleTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, info: RoleInfo) -> Self {
        self.roles.insert(info.role, info);
        self
    }

    pub fn get(&self, role: Role) -> Option<&RoleInfo> {
        self.roles.get(&role)
    }

    /// Descriptors ordered by role.
    pub fn iter(&self) -> impl Iterator<Item = &RoleInfo> {
        let mut infos: Vec<&RoleInfo> = self.roles.values().collect();
        infos.sort_by_key(|info| info.role);
        infos.into_iter()
    }

    pub fn standard() -> Self {
        Self::empty()
            .with_role(RoleInfo::new(Role::SuperAdmin, "Super Administrator", ALL.iter().copied()))
            .with_role(RoleInfo::new(
                Role::BranchManager,
                "Branch Manager",
                [
                    CARS_VIEW,
                    CARS_CREATE,
                    CARS_EDIT,
                    BOOKINGS_VIEW,
                    BOOKINGS_CREATE,
                    BOOKINGS_EDIT,
                    BOOKINGS_CANCEL,
                    BOOKINGS_REFUND,
                    CUSTOMERS_VIEW,
                    CUSTOMERS_CREATE,
                    CUSTOMERS_EDIT,
                    EMPLOYEES_VIEW,
                    EMPLOYEES_CREATE,
                    EMPLOYEES_EDIT,
                    ANALYTICS_VIEW,
                    REPORTS_VIEW,
                    REPORTS_EXPORT,
                ],
            ))
            .with_role(RoleInfo::new(
                Role::BookingAgent,
                "Booking Agent",
                [
                    CARS_VIEW,
                    BOOKINGS_VIEW,
                    BOOKINGS_CREATE,
                    BOOKINGS_EDIT,
                    BOOKINGS_CANCEL,
                    CUSTOMERS_VIEW,
                    CUSTOMERS_CREATE,
                    CUSTOMERS_EDIT,
                ],
            ))
            .with_role(RoleInfo::new(
                Role::CustomerService,
                "Customer Service",
                [
                    CARS_VIEW,
                    BOOKINGS_VIEW,
                    BOOKINGS_EDIT,
                    BOOKINGS_CANCEL,
                    CUSTOMERS_VIEW,
                    CUSTOMERS_EDIT,
                ],
            ))
            .with_role(RoleInfo::new(
                Role::MaintenanceStaff,
                "Maintenance Staff",
                [CARS_VIEW, CARS_EDIT, BOOKINGS_VIEW],
            ))
            .with_role(RoleInfo::new(
                Role::Accountant,
                "Accountant",
                [
                    BOOKINGS_VIEW,
                    BOOKINGS_REFUND,
                    ANALYTICS_VIEW,
                    REPORTS_VIEW,
                    REPORTS_EXPORT,
                ],
            ))
    }
}
