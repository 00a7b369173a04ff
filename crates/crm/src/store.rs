//! Persistence ports.
//!
//! Implementations own the records; services re-read through these traits on
//! every call and never cache results. Each implementation also enforces the
//! uniqueness constraints itself, as the backstop behind the advisory checks
//! in [`crate::invariants`].

use async_trait::async_trait;
use thiserror::Error;

use minicrm_auth::{Role, Scope};
use minicrm_core::{CustomerId, TaskId, UserId};

use crate::{Customer, CustomerPatch, NewCustomer, NewTask, NewUser, Task, TaskStatus, TaskView, User};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced record does not exist, or is still referenced.
    #[error("foreign key violated: {0}")]
    ForeignKey(String),

    /// The backend is unreachable or the connection was lost.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure (decode errors, unexpected rows, ...).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Lookup key for the customer uniqueness pre-check.
///
/// A record matches when *any* supplied field equals the stored value.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct UniqueFields<'a> {
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
}

impl UniqueFields<'_> {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none()
    }
}

/// Query-time filter for task listings.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub assignee: Option<UserId>,
}

impl From<Scope> for TaskFilter {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::All => Self { assignee: None },
            Scope::AssignedTo(user_id) => Self {
                assignee: Some(user_id),
            },
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    /// Returns `None` when the user does not exist.
    async fn update_user_role(&self, id: UserId, role: Role) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>>;

    /// Every customer (other than `exclude`) sharing any supplied field,
    /// ordered by id. At most one record per field, given the unique constraints.
    async fn find_customers_by_unique_fields(
        &self,
        fields: UniqueFields<'_>,
        exclude: Option<CustomerId>,
    ) -> StoreResult<Vec<Customer>>;

    async fn create_customer(&self, customer: NewCustomer) -> StoreResult<Customer>;

    /// Returns `None` when the customer does not exist.
    async fn update_customer(&self, id: CustomerId, patch: CustomerPatch) -> StoreResult<Option<Customer>>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_customer(&self, id: CustomerId) -> StoreResult<bool>;

    /// One page ordered newest first, plus the total record count.
    async fn list_customers(&self, skip: u64, take: u64) -> StoreResult<(Vec<Customer>, u64)>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>>;
    async fn create_task(&self, task: NewTask) -> StoreResult<TaskView>;
    /// Sets the status and refreshes `updated_at`; `None` when absent.
    async fn update_task_status(&self, id: TaskId, status: TaskStatus) -> StoreResult<Option<TaskView>>;
    /// Tasks matching `filter`, newest first.
    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<TaskView>>;
}

/// A backend serving all three record kinds.
pub trait CrmStore: UserStore + CustomerStore + TaskStore {}

impl<T> CrmStore for T where T: UserStore + CustomerStore + TaskStore {}
