//! Collaborator wiring: pick a store backend and build the services over it.

use std::sync::Arc;

use anyhow::Context;

use minicrm_auth::{Argon2PasswordHasher, CredentialIssuer, Hs256CredentialIssuer, PasswordHasher};
use minicrm_crm::services::Services;
use minicrm_infra::{InMemoryStore, PostgresStore};

use crate::config::AppConfig;

/// Build services against Postgres when a database URL is configured,
/// otherwise against a fresh in-memory store.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<Services> {
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());
    let issuer: Arc<dyn CredentialIssuer> = Arc::new(Hs256CredentialIssuer::new(
        config.jwt_secret.clone().into_bytes(),
        config.jwt_ttl,
    ));

    match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresStore::connect(url).await.context("failed to connect to postgres")?;
            store.migrate().await.context("failed to apply schema")?;
            tracing::info!("using postgres store");
            Ok(Services::new(Arc::new(store), hasher, issuer))
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory store");
            Ok(in_memory_services(hasher, issuer))
        }
    }
}

pub fn in_memory_services(hasher: Arc<dyn PasswordHasher>, issuer: Arc<dyn CredentialIssuer>) -> Services {
    Services::new(Arc::new(InMemoryStore::new()), hasher, issuer)
}
