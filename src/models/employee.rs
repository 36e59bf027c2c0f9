use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::events::{Loggable, Severity};
use crate::models::rbac::Role;
use crate::utils::{is_plausible_email, require_non_empty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

/// Staff member; the actor whose role drives permission checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: Role,
    pub status: EmployeeStatus,
    pub password_changed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}

impl Loggable for Employee {
    fn entity_type() -> &'static str { "employee" }
    fn subject_id(&self) -> Uuid { self.id }
    fn severity(&self) -> Severity { Severity::Critical }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeCreateRequest {
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: Role,
}

impl EmployeeCreateRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("department", &self.department)?;
        if !is_plausible_email(&self.email) {
            return Err(AppError::validation("email must be a valid address"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub role: Option<Role>,
    pub status: Option<EmployeeStatus>,
}

impl EmployeeUpdateRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(department) = &self.department {
            require_non_empty("department", department)?;
        }
        if let Some(email) = &self.email {
            if !is_plausible_email(email) {
                return Err(AppError::validation("email must be a valid address"));
            }
        }
        Ok(())
    }
}
