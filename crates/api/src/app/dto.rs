use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::http::StatusCode;
use serde::Deserialize;

use minicrm_auth::Role;
use minicrm_core::{CustomerId, PageRequest, UserId};
use minicrm_crm::services::{CreateTask, Registration};
use minicrm_crm::{CustomerPatch, NewCustomer, TaskStatus};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl From<RegisterRequest> for Registration {
    fn from(body: RegisterRequest) -> Self {
        Registration {
            name: body.name,
            email: body.email,
            password: body.password,
            role: body.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
}

impl From<CreateCustomerRequest> for NewCustomer {
    fn from(body: CreateCustomerRequest) -> Self {
        NewCustomer {
            name: body.name,
            email: body.email,
            phone: body.phone,
            company: body.company,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl From<UpdateCustomerRequest> for CustomerPatch {
    fn from(body: UpdateCustomerRequest) -> Self {
        CustomerPatch {
            name: body.name,
            email: body.email,
            phone: body.phone,
            company: body.company,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: UserId,
    pub customer_id: CustomerId,
    pub status: Option<TaskStatus>,
}

impl From<CreateTaskRequest> for CreateTask {
    fn from(body: CreateTaskRequest) -> Self {
        CreateTask {
            title: body.title,
            description: body.description,
            assigned_to: body.assigned_to,
            customer_id: body.customer_id,
            status: body.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRoleRequest {
    pub role: Role,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::normalized(query.page, query.limit)
    }
}

// -------------------------
// Extraction helpers
// -------------------------

/// Unwrap a JSON body, reporting malformed payloads as 400 in the common error shape.
#[allow(clippy::result_large_err)]
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, axum::response::Response> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text()))
}

#[allow(clippy::result_large_err)]
pub fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, axum::response::Response> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text()))
}

/// Parse a path id (`CustomerId`, `TaskId`, `UserId`).
#[allow(clippy::result_large_err)]
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = minicrm_core::DomainError>,
{
    raw.parse::<T>()
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

#[cfg(test)]
mod tests {
    use minicrm_core::TaskId;

    use super::*;

    #[test]
    fn task_request_uses_camel_case_wire_names() {
        let body: CreateTaskRequest = serde_json::from_str(
            r#"{"title":"Call back","assignedTo":1,"customerId":7,"status":"IN_PROGRESS"}"#,
        )
        .unwrap();
        assert_eq!(body.assigned_to, UserId::new(1));
        assert_eq!(body.customer_id, CustomerId::new(7));
        assert_eq!(body.status, Some(TaskStatus::InProgress));
    }

    #[test]
    fn page_query_normalizes_non_positive_values() {
        let request = PageRequest::from(PageQuery {
            page: Some(0),
            limit: Some(-5),
        });
        assert_eq!(request, PageRequest::normalized(None, None));
    }

    #[test]
    fn malformed_ids_are_bad_requests() {
        assert_eq!(parse_id::<TaskId>("abc").unwrap_err().status(), StatusCode::BAD_REQUEST);
        assert_eq!(parse_id::<TaskId>("12").ok(), Some(TaskId::new(12)));
    }
}
