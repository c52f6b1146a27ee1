//! Infrastructure layer: catalog storage, configuration and the service
//! facade the request-handling layer calls.

pub mod config;
pub mod service;
pub mod store;


pub use config::{CatalogConfig, ConfigError};
pub use service::{CatalogError, CatalogService};
pub use store::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore, StoreError};
