use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use minicrm_auth::Principal;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<Principal>) -> impl IntoResponse {
    Json(serde_json::json!({
        "userId": principal.user_id,
        "role": principal.role,
    }))
}
