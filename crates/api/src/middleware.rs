use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use minicrm_crm::services::AuthService;

use crate::app::errors;

#[derive(Clone)]
pub struct AuthState {
    pub auth: AuthService,
}

/// Authenticate the bearer credential and attach the resulting
/// [`minicrm_auth::Principal`] to the request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let principal = match state.auth.authenticate(extract_bearer(req.headers()), Utc::now()) {
        Ok(principal) => principal,
        Err(e) => return errors::service_error_to_response(e),
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}

/// The token of an `Authorization: Bearer <token>` header, if present.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Some("abc.def"));
    }

    #[test]
    fn other_schemes_and_blank_tokens_are_ignored() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
        assert_eq!(extract_bearer(&headers("Basic Zm9vOmJhcg==")), None);
        assert_eq!(extract_bearer(&headers("Bearer   ")), None);
    }
}
