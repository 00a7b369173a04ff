use chrono::{DateTime, Utc};
use serde::Serialize;

use minicrm_auth::Role;
use minicrm_core::{DomainError, DomainResult, UserId};

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A stored user, including its password hash.
///
/// Never serialized; use [`PublicUser`] for anything leaving the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a user; the secret is already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// User view with the secret stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Validate registration input before anything is hashed or stored.
pub fn validate_registration(name: &str, email: &str, password: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    if !email.contains('@') {
        return Err(DomainError::validation("email must be a valid address"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected() {
        let err = validate_registration("Jo", "jo@example.com", "short").unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("at least 8")));
    }

    #[test]
    fn public_view_drops_the_hash() {
        let user = User {
            id: UserId::new(1),
            name: "Jo".into(),
            email: "jo@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Employee,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "EMPLOYEE");
    }
}
