use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{patch, post},
};

use minicrm_auth::Principal;
use minicrm_core::TaskId;
use minicrm_crm::services::Services;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_task).get(list_tasks))
        .route("/:id/status", patch(update_task_status))
}

pub async fn create_task(
    Extension(services): Extension<Arc<Services>>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<dto::CreateTaskRequest>, JsonRejection>,
) -> Response {
    let body = match dto::body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.tasks.create(&principal, body.into()).await {
        Ok(task) => (StatusCode::CREATED, Json(task)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Admins see every task; employees only their own.
pub async fn list_tasks(
    Extension(services): Extension<Arc<Services>>,
    Extension(principal): Extension<Principal>,
) -> Response {
    match services.tasks.list(&principal).await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_task_status(
    Extension(services): Extension<Arc<Services>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateTaskStatusRequest>, JsonRejection>,
) -> Response {
    let id: TaskId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let body = match dto::body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.tasks.update_status(&principal, id, body.status).await {
        Ok(task) => (StatusCode::OK, Json(task)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
