//! `minicrm-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. It owns the
//! request gate (role and ownership decisions), the per-operation policy
//! table, and the two credential collaborators: the bearer token issuer and
//! the password hasher.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token;

pub use authorize::{AuthzError, Ownership, OperationPolicy, Principal, Scope, authenticate, authorize, listing_scope};
pub use claims::{Claims, TokenValidationError, validate_claims};
pub use password::{Argon2PasswordHasher, PasswordError, PasswordHasher};
pub use roles::Role;
pub use token::{CredentialIssuer, Hs256CredentialIssuer, TokenError};
