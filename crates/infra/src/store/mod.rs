//! Implementations of the `minicrm-crm` store ports.
//!
//! - `in_memory`: process-local tables for tests/dev
//! - `postgres`: sqlx-backed relational store

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
