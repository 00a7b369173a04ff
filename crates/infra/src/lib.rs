//! Infrastructure layer: persistence adapters for the CRM store ports.

pub mod store;

pub use store::{InMemoryStore, PostgresStore};
