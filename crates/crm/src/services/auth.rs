//! Registration, login and bearer authentication.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use minicrm_auth::{CredentialIssuer, PasswordHasher, Principal, Role, authenticate};
use minicrm_core::UserId;

use crate::user::validate_registration;
use crate::{ConflictField, NewUser, PublicUser, ServiceError, ServiceResult, User, UserStore};

const INVALID_LOGIN: &str = "invalid email or password";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub access_token: String,
    pub user: UserSummary,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: Arc<dyn CredentialIssuer>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>, issuer: Arc<dyn CredentialIssuer>) -> Self {
        Self { users, hasher, issuer }
    }

    /// First pipeline stage: turn a presented bearer credential into a
    /// principal. Runs before any store access.
    pub fn authenticate(&self, bearer: Option<&str>, now: DateTime<Utc>) -> ServiceResult<Principal> {
        Ok(authenticate(self.issuer.as_ref(), bearer, now)?)
    }

    pub async fn register(&self, registration: Registration) -> ServiceResult<PublicUser> {
        validate_registration(&registration.name, &registration.email, &registration.password)?;

        if self.users.find_user_by_email(&registration.email).await?.is_some() {
            tracing::warn!("registration rejected: email already in use");
            return Err(ServiceError::Conflict(ConflictField::Email));
        }

        let password_hash = self.hasher.hash(&registration.password)?;
        let user = self
            .users
            .create_user(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash,
                role: registration.role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user.into())
    }

    /// Check an email/password pair against the credential store.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> ServiceResult<User> {
        let user = self
            .users
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| ServiceError::Unauthenticated(INVALID_LOGIN.to_string()))?;

        if !self.hasher.verify(password, &user.password_hash)? {
            return Err(ServiceError::Unauthenticated(INVALID_LOGIN.to_string()));
        }
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str, now: DateTime<Utc>) -> ServiceResult<LoginResult> {
        let user = self.verify_credentials(email, password).await?;
        let access_token = self.issuer.issue(&Principal::new(user.id, user.role), now)?;

        tracing::info!(user_id = %user.id, "login succeeded");
        Ok(LoginResult {
            access_token,
            user: UserSummary {
                id: user.id,
                name: user.name,
                email: user.email,
                role: user.role,
            },
        })
    }
}
