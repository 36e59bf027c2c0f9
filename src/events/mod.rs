use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

pub mod loggable;
pub use loggable::{Loggable, Severity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent<T> {
    pub id: Uuid,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub payload: T,
}

impl<T> DomainEvent<T> {
    pub fn new(name: impl Into<String>, actor_id: Option<Uuid>, subject_id: Option<Uuid>, payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            occurred_at: Utc::now(),
            actor_id,
            subject_id,
            payload,
        }
    }
}

pub type EventBus = broadcast::Sender<Value>;

pub fn init_event_bus(capacity: usize) -> (EventBus, broadcast::Receiver<Value>) {
    broadcast::channel(capacity)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPayload {
    /// The current/new state of the entity
    #[serde(rename = "new")]
    pub current: Value,
    /// The previous state (for update/delete operations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    pub severity: Severity,
}

/// Publishes `<entity>.<action>` for any `Loggable` entity and returns the
/// serialized event.
///
/// A bus without subscribers drops its copy.
pub fn log_activity<T: Loggable>(
    event_bus: &EventBus,
    action: &str,
    actor_id: Option<Uuid>,
    entity: &T,
    old_entity: Option<&T>,
) -> Value {
    let event_name = format!("{}.{}", T::entity_type(), action);
    let severity = entity.severity_for_action(action);
    let payload = ActivityPayload {
        current: serde_json::to_value(entity).unwrap_or_default(),
        old: old_entity.map(|e| serde_json::to_value(e).unwrap_or_default()),
        severity,
    };

    let event = DomainEvent::new(
        event_name,
        actor_id,
        Some(entity.subject_id()),
        serde_json::to_value(&payload).unwrap_or_default(),
    );

    let event = serde_json::to_value(event).unwrap_or_default();
    let _ = event_bus.send(event.clone());
    event
}

fn describe(name: &str) -> String {
    match name {
        "car.created" => "Car added to fleet",
        "car.updated" => "Car updated",
        "car.deleted" => "Car removed from fleet",
        "booking.created" => "Booking created",
        "booking.status_changed" => "Booking status changed",
        "booking.paid" => "Booking payment recorded",
        "booking.refunded" => "Booking refunded",
        "booking.deleted" => "Booking deleted",
        "customer.created" => "Customer registered",
        "customer.updated" => "Customer updated",
        "customer.deleted" => "Customer deleted",
        "employee.created" => "Employee added",
        "employee.updated" => "Employee updated",
        "employee.deleted" => "Employee removed",
        _ => "System event",
    }
    .to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub event_name: String,
    pub description: String,
    pub actor_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
    pub severity: Severity,
    pub properties: Value,
    pub prev_hash: Option<String>,
    pub hash: String,
}

fn chain_hash(prev_hash: Option<&str>, properties: &Value) -> String {
    let mut hasher = Sha256::new();
    if let Some(prev) = prev_hash {
        hasher.update(prev.as_bytes());
    }
    hasher.update(serde_json::to_string(properties).unwrap_or_default().as_bytes());
    hex::encode(hasher.finalize())
}

/// In-memory activity feed. Each entry hashes its predecessor's hash
/// together with its own properties.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Arc<RwLock<Vec<ActivityEntry>>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, event: Value) -> ActivityEntry {
        let name = event.get("name").and_then(|v| v.as_str()).unwrap_or("unknown").to_string();
        let actor_id = event
            .get("actor_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());
        let subject_id = event
            .get("subject_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());
        let occurred_at = event
            .get("occurred_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let severity = event
            .get("payload")
            .and_then(|p| p.get("severity"))
            .and_then(|s| serde_json::from_value::<Severity>(s.clone()).ok())
            .unwrap_or_default();

        let mut entries = self.entries.write().await;
        let prev_hash = entries.last().map(|entry| entry.hash.clone());
        let hash = chain_hash(prev_hash.as_deref(), &event);

        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            description: describe(&name),
            event_name: name,
            actor_id,
            subject_id,
            occurred_at,
            severity,
            properties: event,
            prev_hash,
            hash,
        };
        entries.push(entry.clone());
        entry
    }

    /// Newest first.
    pub async fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn verify_chain(&self) -> bool {
        let entries = self.entries.read().await;
        let mut prev: Option<&str> = None;
        for entry in entries.iter() {
            if entry.prev_hash.as_deref() != prev {
                return false;
            }
            if chain_hash(prev, &entry.properties) != entry.hash {
                return false;
            }
            prev = Some(entry.hash.as_str());
        }
        true
    }
}
