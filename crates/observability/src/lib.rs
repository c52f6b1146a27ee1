//! Structured logging setup shared by shopfront binaries and tests.

pub mod tracing;

pub use self::tracing::{DEFAULT_FILTER, init, init_for_tests};
