//! `minicrm-crm` — customer, task and user records plus the services that
//! gate and validate every operation on them.
//!
//! Layout:
//! - `user`, `customer`, `task`: records and write inputs
//! - `store`: persistence ports (implemented in `minicrm-infra`)
//! - `invariants`: uniqueness and relational checks, independent of caller
//! - `services`: authenticate → authorize → check → persist pipelines
//! - `error`: the typed failure taxonomy returned upward

pub mod customer;
pub mod error;
pub mod invariants;
pub mod services;
pub mod store;
pub mod task;
pub mod user;

pub use customer::{Customer, CustomerPatch, NewCustomer};
pub use error::{ConflictField, Entity, ServiceError, ServiceResult};
pub use store::{CrmStore, CustomerStore, StoreError, StoreResult, TaskFilter, TaskStore, UniqueFields, UserStore};
pub use task::{AssigneeSummary, CustomerSummary, NewTask, Task, TaskStatus, TaskView};
pub use user::{NewUser, PublicUser, User};
