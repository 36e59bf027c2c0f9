pub mod authz;
pub mod config;
pub mod errors;
pub mod events;
pub mod fixtures;
pub mod models;
pub mod store;
pub mod utils;

// Re-export commonly used items for tests
pub use authz::{PermissionEngine, Session};
pub use config::StoreConfig;
pub use errors::{AppError, AppResult};
pub use store::FleetStore;
