use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;

use minicrm_crm::services::Services;

use crate::app::{dto, errors};

/// Public endpoints; no bearer credential required.
pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub async fn register(
    Extension(services): Extension<Arc<Services>>,
    body: Result<Json<dto::RegisterRequest>, JsonRejection>,
) -> Response {
    let body = match dto::body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.auth.register(body.into()).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<Services>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Response {
    let body = match dto::body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.auth.login(&body.email, &body.password, Utc::now()).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
