use std::time::Duration;

use crate::errors::AppError;

const DEFAULT_LATENCY_MS: u64 = 300;
const DEFAULT_ACTIVITY_CAPACITY: usize = 1024;

/// Runtime settings for the in-memory store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Artificial delay applied to every permitted store call.
    pub latency: Duration,
    /// Capacity of the activity broadcast channel.
    pub activity_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(DEFAULT_LATENCY_MS),
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let latency_ms = std::env::var("FLEET_LATENCY_MS")
            .map(|val| val.parse::<u64>())
            .unwrap_or(Ok(DEFAULT_LATENCY_MS))
            .map_err(|_| AppError::configuration("FLEET_LATENCY_MS must be a non-negative integer"))?;

        let activity_capacity = std::env::var("FLEET_ACTIVITY_CAPACITY")
            .map(|val| val.parse::<usize>())
            .unwrap_or(Ok(DEFAULT_ACTIVITY_CAPACITY))
            .map_err(|_| AppError::configuration("FLEET_ACTIVITY_CAPACITY must be a positive integer"))?;

        if activity_capacity == 0 {
            return Err(AppError::configuration("FLEET_ACTIVITY_CAPACITY must be greater than zero"));
        }

        Ok(Self {
            latency: Duration::from_millis(latency_ms),
            activity_capacity,
        })
    }

    /// Config with no artificial delay, used by tests and tooling.
    pub fn immediate() -> Self {
        Self {
            latency: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}
