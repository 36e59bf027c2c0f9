use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::events::Loggable;
use crate::utils::{is_plausible_email, require_non_empty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    Active,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
    pub status: CustomerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Customer {
    fn entity_type() -> &'static str { "customer" }
    fn subject_id(&self) -> Uuid { self.id }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerCreateRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
}

impl CustomerCreateRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("name", &self.name)?;
        require_non_empty("phone", &self.phone)?;
        require_non_empty("license_number", &self.license_number)?;
        if !is_plausible_email(&self.email) {
            return Err(AppError::validation("email must be a valid address"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub status: Option<CustomerStatus>,
}

impl CustomerUpdateRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(phone) = &self.phone {
            require_non_empty("phone", phone)?;
        }
        if let Some(license) = &self.license_number {
            require_non_empty("license_number", license)?;
        }
        if let Some(email) = &self.email {
            if !is_plausible_email(email) {
                return Err(AppError::validation("email must be a valid address"));
            }
        }
        Ok(())
    }
}
