//! `shopfront-core`: identifiers and the domain error type shared by the
//! catalog and infrastructure crates. No storage, no HTTP.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, ProductId, UserId};
