//! Infrastructure layer: configuration, flat-file persistence and the
//! serialized inventory service.

pub mod config;
pub mod error;
pub mod files;
pub mod service;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::StoreConfig;
pub use error::{ConfigError, ServiceError, StoreError};
pub use service::{InventoryService, ServiceResult};
pub use store::{FlatFileStore, MemoryStore, SnapshotStore};
