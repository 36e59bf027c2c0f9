use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::events::Loggable;
use crate::utils::{matches_search, require_non_empty};

const MIN_MODEL_YEAR: i32 = 1990;
/// Upper bound on a daily rate, in cents.
pub const MAX_DAILY_RATE: i64 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarCategory {
    Economy,
    Compact,
    Suv,
    Luxury,
    Van,
}

impl CarCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarCategory::Economy => "economy",
            CarCategory::Compact => "compact",
            CarCategory::Suv => "suv",
            CarCategory::Luxury => "luxury",
            CarCategory::Van => "van",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarStatus {
    Available,
    Rented,
    Maintenance,
    Retired,
}

impl CarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Available => "available",
            CarStatus::Rented => "rented",
            CarStatus::Maintenance => "maintenance",
            CarStatus::Retired => "retired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub plate: String,
    pub category: CarCategory,
    pub status: CarStatus,
    /// Daily rate in cents.
    pub daily_rate: i64,
    pub mileage: u32,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Car {
    fn entity_type() -> &'static str { "car" }
    fn subject_id(&self) -> Uuid { self.id }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarCreateRequest {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub plate: String,
    pub category: CarCategory,
    pub daily_rate: i64,
    #[serde(default)]
    pub mileage: u32,
    pub location: String,
}

impl CarCreateRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("make", &self.make)?;
        require_non_empty("model", &self.model)?;
        require_non_empty("plate", &self.plate)?;
        require_non_empty("location", &self.location)?;
        validate_year(self.year)?;
        validate_rate(self.daily_rate)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarUpdateRequest {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub plate: Option<String>,
    pub category: Option<CarCategory>,
    pub status: Option<CarStatus>,
    pub daily_rate: Option<i64>,
    pub mileage: Option<u32>,
    pub location: Option<String>,
}

impl CarUpdateRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(make) = &self.make {
            require_non_empty("make", make)?;
        }
        if let Some(model) = &self.model {
            require_non_empty("model", model)?;
        }
        if let Some(plate) = &self.plate {
            require_non_empty("plate", plate)?;
        }
        if let Some(location) = &self.location {
            require_non_empty("location", location)?;
        }
        if let Some(year) = self.year {
            validate_year(year)?;
        }
        if let Some(rate) = self.daily_rate {
            validate_rate(rate)?;
        }
        Ok(())
    }
}

/// List filter for the fleet view; unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarFilter {
    pub status: Option<CarStatus>,
    pub category: Option<CarCategory>,
    pub search: Option<String>,
}

impl CarFilter {
    pub fn matches(&self, car: &Car) -> bool {
        self.status.map_or(true, |status| car.status == status)
            && self.category.map_or(true, |category| car.category == category)
            && self
                .search
                .as_deref()
                .map_or(true, |needle| matches_search(needle, &[car.make.as_str(), car.model.as_str(), car.plate.as_str()]))
    }
}

fn validate_year(year: i32) -> AppResult<()> {
    let max_year = Utc::now().year() + 1;
    if !(MIN_MODEL_YEAR..=max_year).contains(&year) {
        return Err(AppError::validation(format!(
            "year must be between {MIN_MODEL_YEAR} and {max_year}"
        )));
    }
    Ok(())
}

fn validate_rate(rate: i64) -> AppResult<()> {
    if rate <= 0 {
        return Err(AppError::validation("daily_rate must be greater than zero"));
    }
    if rate > MAX_DAILY_RATE {
        return Err(AppError::validation(format!(
            "daily_rate must not exceed {MAX_DAILY_RATE} cents"
        )));
    }
    Ok(())
}
