//! Relational catalog store for the gemmirror service.
//!
//! This crate owns the lifecycle of the `packages`, `package_versions`
//! and `dependencies` tables. All mutation goes through the
//! transactional operations in [`repository::SpecStore`]; nothing else
//! writes to the catalog.

pub mod connection;
pub mod error;
pub mod migration;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::{Database, DbConnection};
pub use error::{DbError, Result};
pub use repository::SpecStore;
