//! Failure taxonomy returned by every service operation.
//!
//! Each kind is terminal for the request; mapping to a transport status is
//! the caller's job.

use thiserror::Error;

use minicrm_auth::{AuthzError, PasswordError, TokenError};
use minicrm_core::DomainError;

use crate::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Record kind named by a not-found failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Entity {
    User,
    /// The user referenced as a task's assignee.
    Assignee,
    Customer,
    Task,
}

impl core::fmt::Display for Entity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Entity::User => "user",
            Entity::Assignee => "assigned user",
            Entity::Customer => "customer",
            Entity::Task => "task",
        })
    }
}

/// Field named by a uniqueness conflict, or the reference blocking a delete.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ConflictField {
    #[error("email already in use")]
    Email,

    #[error("phone already in use")]
    Phone,

    #[error("duplicate customer")]
    Duplicate,

    #[error("customer has assigned tasks")]
    HasTasks,
}

impl ConflictField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictField::Email => "email",
            ConflictField::Phone => "phone",
            ConflictField::Duplicate => "duplicate",
            ConflictField::HasTasks => "tasks",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(Entity),

    #[error("{0}")]
    Conflict(ConflictField),

    /// Semantically invalid payload (e.g. a non-employee assignee).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The hashing or signing collaborator failed.
    #[error("credential failure: {0}")]
    Credential(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl ServiceError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Unauthenticated(msg) => Self::Unauthenticated(msg),
            AuthzError::Forbidden(msg) => Self::Forbidden(msg),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => Self::InvalidInput(msg),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(value: PasswordError) -> Self {
        Self::Credential(value.to_string())
    }
}

impl From<TokenError> for ServiceError {
    fn from(value: TokenError) -> Self {
        Self::Credential(value.to_string())
    }
}
