use axum::{Router, routing::get};

pub mod auth;
pub mod customers;
pub mod system;
pub mod tasks;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/customers", customers::router())
        .nest("/tasks", tasks::router())
        .nest("/users", users::router())
}
