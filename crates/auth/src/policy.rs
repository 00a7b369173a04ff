//! Per-operation access policies.
//!
//! Registration and login are public and have no entry here.

use crate::{OperationPolicy, Ownership, Role};

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const STAFF: &[Role] = &[Role::Admin, Role::Employee];

pub const CREATE_CUSTOMER: OperationPolicy = OperationPolicy {
    name: "customers.create",
    allowed: ADMIN_ONLY,
    ownership: Ownership::Unscoped,
};

pub const LIST_CUSTOMERS: OperationPolicy = OperationPolicy {
    name: "customers.list",
    allowed: STAFF,
    ownership: Ownership::Unscoped,
};

pub const GET_CUSTOMER: OperationPolicy = OperationPolicy {
    name: "customers.get",
    allowed: STAFF,
    ownership: Ownership::Unscoped,
};

pub const UPDATE_CUSTOMER: OperationPolicy = OperationPolicy {
    name: "customers.update",
    allowed: ADMIN_ONLY,
    ownership: Ownership::Unscoped,
};

pub const DELETE_CUSTOMER: OperationPolicy = OperationPolicy {
    name: "customers.delete",
    allowed: ADMIN_ONLY,
    ownership: Ownership::Unscoped,
};

pub const CREATE_TASK: OperationPolicy = OperationPolicy {
    name: "tasks.create",
    allowed: ADMIN_ONLY,
    ownership: Ownership::Unscoped,
};

pub const LIST_TASKS: OperationPolicy = OperationPolicy {
    name: "tasks.list",
    allowed: STAFF,
    ownership: Ownership::Assignee,
};

pub const UPDATE_TASK_STATUS: OperationPolicy = OperationPolicy {
    name: "tasks.update_status",
    allowed: STAFF,
    ownership: Ownership::Assignee,
};

pub const LIST_USERS: OperationPolicy = OperationPolicy {
    name: "users.list",
    allowed: ADMIN_ONLY,
    ownership: Ownership::Unscoped,
};

pub const GET_USER: OperationPolicy = OperationPolicy {
    name: "users.get",
    allowed: ADMIN_ONLY,
    ownership: Ownership::Unscoped,
};

pub const UPDATE_USER_ROLE: OperationPolicy = OperationPolicy {
    name: "users.update_role",
    allowed: ADMIN_ONLY,
    ownership: Ownership::Unscoped,
};

pub const ALL: [OperationPolicy; 11] = [
    CREATE_CUSTOMER,
    LIST_CUSTOMERS,
    GET_CUSTOMER,
    UPDATE_CUSTOMER,
    DELETE_CUSTOMER,
    CREATE_TASK,
    LIST_TASKS,
    UPDATE_TASK_STATUS,
    LIST_USERS,
    GET_USER,
    UPDATE_USER_ROLE,
];
