//! Authorization module - Permission Engine and Session
//!
//! This module implements the role-based permission model:
//! - A static role table mapping each role to its full capability set
//! - Fail-closed capability checks against the current session
//! - A separate, explicit policy for which roles an actor may grant

mod engine;
mod session;

pub use engine::{AssignmentPolicy, PermissionEngine};
pub use session::{AuthState, Session};

/// Well-known capability names, `<resource>.<action>`
pub mod capabilities {
    // Cars
    pub const CARS_VIEW: &str = "cars.view";
    pub const CARS_CREATE: &str = "cars.create";
    pub const CARS_EDIT: &str = "cars.edit";
    pub const CARS_DELETE: &str = "cars.delete";

    // Bookings
    pub const BOOKINGS_VIEW: &str = "bookings.view";
    pub const BOOKINGS_CREATE: &str = "bookings.create";
    pub const BOOKINGS_EDIT: &str = "bookings.edit";
    pub const BOOKINGS_CANCEL: &str = "bookings.cancel";
    pub const BOOKINGS_REFUND: &str = "bookings.refund";
    pub const BOOKINGS_DELETE: &str = "bookings.delete";

    // Customers
    pub const CUSTOMERS_VIEW: &str = "customers.view";
    pub const CUSTOMERS_CREATE: &str = "customers.create";
    pub const CUSTOMERS_EDIT: &str = "customers.edit";
    pub const CUSTOMERS_DELETE: &str = "customers.delete";

    // Employees
    pub const EMPLOYEES_VIEW: &str = "employees.view";
    pub const EMPLOYEES_CREATE: &str = "employees.create";
    pub const EMPLOYEES_EDIT: &str = "employees.edit";
    pub const EMPLOYEES_DELETE: &str = "employees.delete";

    // Analytics & reporting
    pub const ANALYTICS_VIEW: &str = "analytics.view";
    pub const REPORTS_VIEW: &str = "reports.view";
    pub const REPORTS_EXPORT: &str = "reports.export";

    // Settings
    pub const SETTINGS_VIEW: &str = "settings.view";
    pub const SETTINGS_EDIT: &str = "settings.edit";

    pub const ALL: &[&str] = &[
        CARS_VIEW,
        CARS_CREATE,
        CARS_EDIT,
        CARS_DELETE,
        BOOKINGS_VIEW,
        BOOKINGS_CREATE,
        BOOKINGS_EDIT,
        BOOKINGS_CANCEL,
        BOOKINGS_REFUND,
        BOOKINGS_DELETE,
        CUSTOMERS_VIEW,
        CUSTOMERS_CREATE,
        CUSTOMERS_EDIT,
        CUSTOMERS_DELETE,
        EMPLOYEES_VIEW,
        EMPLOYEES_CREATE,
        EMPLOYEES_EDIT,
        EMPLOYEES_DELETE,
        ANALYTICS_VIEW,
        REPORTS_VIEW,
        REPORTS_EXPORT,
        SETTINGS_VIEW,
        SETTINGS_EDIT,
    ];
}
