//! The request gate: authentication of a presented credential and the role /
//! ownership decision made before any invariant check or mutation.

use chrono::{DateTime, Utc};
use thiserror::Error;

use minicrm_core::UserId;

use crate::{CredentialIssuer, Role, TokenError};

/// A verified caller: the `{userId, role}` pair recovered from a credential.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No credential, or one that failed to parse, verify, or is expired.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Valid credential, but the role or ownership check failed.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Whether an operation is restricted to records the caller owns.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// Any caller passing the role gate may act on any record.
    Unscoped,
    /// Non-admin callers may only act on records assigned to them.
    Assignee,
}

/// Declared access requirements of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationPolicy {
    pub name: &'static str,
    pub allowed: &'static [Role],
    pub ownership: Ownership,
}

impl OperationPolicy {
    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }
}

/// Record subset a caller may see for a self-scoped listing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    AssignedTo(UserId),
}

/// Recover a [`Principal`] from a bearer credential.
///
/// Missing, malformed, badly signed and expired credentials all map to
/// [`AuthzError::Unauthenticated`], never to `Forbidden`.
pub fn authenticate(
    issuer: &dyn CredentialIssuer,
    bearer: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Principal, AuthzError> {
    let token = bearer
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthzError::Unauthenticated("missing bearer credential".to_string()))?;

    let claims = issuer.parse(token, now).map_err(|e| {
        tracing::debug!(error = %e, "bearer credential rejected");
        match e {
            TokenError::Expired => AuthzError::Unauthenticated("credential expired".to_string()),
            _ => AuthzError::Unauthenticated("invalid credential".to_string()),
        }
    })?;

    Ok(Principal::new(claims.user_id, claims.role))
}

/// Authorize a principal for one operation.
///
/// - No IO
/// - No panics
/// - `owner` is only consulted for [`Ownership::Assignee`] policies, and is
///   waived for admins.
pub fn authorize(
    principal: &Principal,
    policy: &OperationPolicy,
    owner: Option<UserId>,
) -> Result<(), AuthzError> {
    if !policy.allows(principal.role) {
        tracing::warn!(
            operation = policy.name,
            user_id = %principal.user_id,
            role = %principal.role,
            "role not permitted"
        );
        return Err(AuthzError::Forbidden(format!(
            "role {} may not perform {}",
            principal.role, policy.name
        )));
    }

    match (policy.ownership, owner) {
        (Ownership::Assignee, Some(owner)) if !principal.role.is_admin() && principal.user_id != owner => {
            tracing::warn!(
                operation = policy.name,
                user_id = %principal.user_id,
                owner_id = %owner,
                "ownership check failed"
            );
            return Err(AuthzError::Forbidden("access denied".to_string()));
        }
        _ => {}
    }

    Ok(())
}

/// Gate a self-scoped listing and return the subset the caller may see.
pub fn listing_scope(principal: &Principal, policy: &OperationPolicy) -> Result<Scope, AuthzError> {
    authorize(principal, policy, None)?;
    match (policy.ownership, principal.role) {
        (Ownership::Assignee, Role::Employee) => Ok(Scope::AssignedTo(principal.user_id)),
        _ => Ok(Scope::All),
    }
}
