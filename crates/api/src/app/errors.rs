use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use minicrm_crm::ServiceError;

/// The single mapping from the service failure taxonomy to HTTP.
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Unauthenticated(msg) => json_error(StatusCode::UNAUTHORIZED, "unauthenticated", msg),
        ServiceError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        ServiceError::NotFound(entity) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{entity} not found")),
        ServiceError::Conflict(field) => json_error(StatusCode::CONFLICT, "conflict", field.to_string()),
        ServiceError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::Credential(msg) => {
            tracing::error!(error = %msg, "credential collaborator failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "credential_error", "credential processing failed")
        }
        ServiceError::Storage(e) => {
            tracing::error!(error = %e, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "storage failure")
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
