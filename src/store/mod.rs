//! In-memory, permission-gated data store.
//!
//! Every call runs the same sequence: synchronous capability check, payload
//! validation, simulated latency, then the mutation under one write lock and an
//! activity entry. A denied call returns before the delay and touches nothing.

mod bookings;
mod cars;
mod customers;
mod employees;
pub mod reports;

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::authz::{capabilities, PermissionEngine, Session};
use crate::config::StoreConfig;
use crate::errors::AppResult;
use crate::events::{init_event_bus, log_activity, ActivityEntry, ActivityLog, EventBus, Loggable};
use crate::fixtures;
use crate::models::booking::Booking;
use crate::models::car::Car;
use crate::models::customer::Customer;
use crate::models::employee::Employee;

#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub cars: Vec<Car>,
    pub bookings: Vec<Booking>,
    pub customers: Vec<Customer>,
    pub employees: Vec<Employee>,
}

#[derive(Clone)]
pub struct FleetStore {
    data: Arc<RwLock<Collections>>,
    engine: PermissionEngine,
    config: StoreConfig,
    event_bus: EventBus,
    activity: ActivityLog,
}

impl FleetStore {
    pub fn new(config: StoreConfig, engine: PermissionEngine, seed: Collections) -> Self {
        let (event_bus, _rx) = init_event_bus(config.activity_capacity.max(1));
        Self {
            data: Arc::new(RwLock::new(seed)),
            engine,
            config,
            event_bus,
            activity: ActivityLog::new(),
        }
    }

    /// Store seeded from the bundled fixtures with the standard role table.
    pub fn with_fixtures(config: StoreConfig) -> Self {
        Self::new(config, PermissionEngine::default(), fixtures::seed())
    }

    pub fn engine(&self) -> &PermissionEngine {
        &self.engine
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Value> {
        self.event_bus.subscribe()
    }

    pub fn activity_log(&self) -> ActivityLog {
        self.activity.clone()
    }

    /// Appends the mutation to the activity log, then publishes it to bus
    /// subscribers.
    async fn record<T: Loggable>(&self, action: &str, actor_id: Uuid, entity: &T, old: Option<&T>) {
        let event = log_activity(&self.event_bus, action, Some(actor_id), entity, old);
        let entry = self.activity.append(event).await;
        tracing::debug!(event = %entry.event_name, severity = entry.severity.as_str(), "activity recorded");
    }

    /// Capability gate; returns the acting employee's id.
    fn gate(&self, session: &Session, capability: &str) -> AppResult<Uuid> {
        match self.engine.require(session, capability) {
            Ok(actor) => Ok(actor.id),
            Err(err) => {
                tracing::warn!(
                    employee_id = ?session.actor().map(|a| a.id),
                    capability = %capability,
                    error = %err,
                    "store call rejected"
                );
                Err(err)
            }
        }
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }

    pub async fn login(&self, session: &mut Session, email: &str, password: &str) -> AppResult<Employee> {
        self.simulate_latency().await;
        let data = self.data.read().await;
        let result = session.login(&data.employees, email, password);
        if result.is_err() {
            tracing::warn!(email = %email, "login rejected");
        }
        result
    }

    pub fn logout(&self, session: &mut Session) {
        session.logout();
    }

    pub async fn recent_activity(&self, session: &Session, limit: usize) -> AppResult<Vec<ActivityEntry>> {
        self.gate(session, capabilities::ANALYTICS_VIEW)?;
        Ok(self.activity.recent(limit).await)
    }

    #[cfg(test)]
    pub(crate) async fn snapshot(&self) -> Collections {
        self.data.read().await.clone()
    }
}
