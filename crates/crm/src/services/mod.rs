//! Resource services.
//!
//! Every operation follows the same pipeline, each stage short-circuiting on
//! failure: the caller has already been authenticated into a [`Principal`]
//! (see [`AuthService::authenticate`]), then the operation's policy is
//! checked, then invariants are checked against freshly read state, and only
//! then is the store written.
//!
//! [`Principal`]: minicrm_auth::Principal

use std::sync::Arc;

use minicrm_auth::{CredentialIssuer, PasswordHasher};

use crate::CrmStore;

pub mod auth;
pub mod customers;
pub mod tasks;
pub mod users;

pub use auth::{AuthService, LoginResult, Registration, UserSummary};
pub use customers::CustomerService;
pub use tasks::{CreateTask, TaskService};
pub use users::UserService;

/// All services wired against one store.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub customers: CustomerService,
    pub tasks: TaskService,
    pub users: UserService,
}

impl Services {
    pub fn new<S>(store: Arc<S>, hasher: Arc<dyn PasswordHasher>, issuer: Arc<dyn CredentialIssuer>) -> Self
    where
        S: CrmStore + 'static,
    {
        Self {
            auth: AuthService::new(store.clone(), hasher, issuer),
            customers: CustomerService::new(store.clone()),
            tasks: TaskService::new(store.clone(), store.clone(), store.clone()),
            users: UserService::new(store),
        }
    }
}
