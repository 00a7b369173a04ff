//! Business invariants enforced on writes regardless of who is calling.
//!
//! The customer checks are advisory: they read current state right before the
//! write, and the store's own unique constraints catch anything that races
//! past them.

use minicrm_auth::Role;
use minicrm_core::{CustomerId, UserId};

use crate::{
    ConflictField, Customer, CustomerPatch, CustomerStore, Entity, NewCustomer, ServiceError, ServiceResult,
    UniqueFields, User, UserStore,
};

/// Decide which field the matched records collide on.
///
/// A single record matching both fields reports email. Email and phone
/// matching two different records is a generic duplicate, as is a match the
/// store reported on neither field exactly.
pub fn classify_conflict(candidate: UniqueFields<'_>, matches: &[Customer]) -> ConflictField {
    let email_hit = |c: &Customer| candidate.email == Some(c.email.as_str());
    let phone_hit = |c: &Customer| candidate.phone == Some(c.phone.as_str());

    if matches.iter().any(|c| email_hit(c) && phone_hit(c)) {
        return ConflictField::Email;
    }
    match (matches.iter().any(|c| email_hit(c)), matches.iter().any(|c| phone_hit(c))) {
        (true, false) => ConflictField::Email,
        (false, true) => ConflictField::Phone,
        _ => ConflictField::Duplicate,
    }
}

/// Fields of `patch` that actually change `current` and so need re-checking.
pub fn changed_unique_fields<'a>(current: &Customer, patch: &'a CustomerPatch) -> UniqueFields<'a> {
    UniqueFields {
        email: patch.email.as_deref().filter(|e| *e != current.email),
        phone: patch.phone.as_deref().filter(|p| *p != current.phone),
    }
}

/// Check a candidate against every other customer.
pub async fn check_customer_write(
    store: &dyn CustomerStore,
    candidate: UniqueFields<'_>,
    exclude: Option<CustomerId>,
) -> ServiceResult<()> {
    if candidate.is_empty() {
        return Ok(());
    }

    let matches = store.find_customers_by_unique_fields(candidate, exclude).await?;
    if matches.is_empty() {
        return Ok(());
    }

    let field = classify_conflict(candidate, &matches);
    tracing::warn!(
        field = field.as_str(),
        existing_ids = ?matches.iter().map(|c| c.id.get()).collect::<Vec<_>>(),
        "customer uniqueness conflict"
    );
    Err(ServiceError::Conflict(field))
}

pub async fn check_customer_create(store: &dyn CustomerStore, candidate: &NewCustomer) -> ServiceResult<()> {
    let fields = UniqueFields {
        email: Some(candidate.email.as_str()),
        phone: Some(candidate.phone.as_str()),
    };
    check_customer_write(store, fields, None).await
}

pub async fn check_customer_update(
    store: &dyn CustomerStore,
    current: &Customer,
    patch: &CustomerPatch,
) -> ServiceResult<()> {
    check_customer_write(store, changed_unique_fields(current, patch), Some(current.id)).await
}

/// Validate the references of a task about to be created.
///
/// Both lookups run concurrently; failures are reported in the fixed order
/// assignee existence, assignee role, customer existence.
pub async fn check_task_create(
    users: &dyn UserStore,
    customers: &dyn CustomerStore,
    assignee_id: UserId,
    customer_id: CustomerId,
) -> ServiceResult<(User, Customer)> {
    let (assignee, customer) = tokio::join!(users.find_user(assignee_id), customers.find_customer(customer_id));

    let assignee = assignee?.ok_or(ServiceError::NotFound(Entity::Assignee))?;
    if assignee.role != Role::Employee {
        return Err(ServiceError::invalid_input("assignedTo must be an EMPLOYEE"));
    }
    let customer = customer?.ok_or(ServiceError::NotFound(Entity::Customer))?;

    Ok((assignee, customer))
}
