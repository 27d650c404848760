//! Connection plumbing for the stores the marketplace runs on.
//!
//! PostgreSQL (through SeaORM) holds users, categories and items. Redis
//! carries the notification stream. Both connectors share the retry helper
//! in [`common`] so services can start before their dependencies are up.

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "redis")]
pub mod redis;

pub use common::{DatabaseError, DatabaseResult, RetryConfig};
