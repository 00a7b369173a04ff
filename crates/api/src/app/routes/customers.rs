use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use minicrm_auth::Principal;
use minicrm_core::CustomerId;
use minicrm_crm::services::Services;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route("/:id", get(get_customer).patch(update_customer).delete(delete_customer))
}

pub async fn create_customer(
    Extension(services): Extension<Arc<Services>>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<dto::CreateCustomerRequest>, JsonRejection>,
) -> Response {
    let body = match dto::body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.customers.create(&principal, body.into()).await {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_customers(
    Extension(services): Extension<Arc<Services>>,
    Extension(principal): Extension<Principal>,
    query: Result<Query<dto::PageQuery>, QueryRejection>,
) -> Response {
    let query = match dto::query(query) {
        Ok(q) => q,
        Err(resp) => return resp,
    };

    match services.customers.list(&principal, query.into()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<Services>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Response {
    let id: CustomerId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.customers.get(&principal, id).await {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_customer(
    Extension(services): Extension<Arc<Services>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateCustomerRequest>, JsonRejection>,
) -> Response {
    let id: CustomerId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let body = match dto::body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    match services.customers.update(&principal, id, body.into()).await {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<Services>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Response {
    let id: CustomerId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.customers.delete(&principal, id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "customer deleted" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
