use std::sync::Arc;

use minicrm_auth::{Principal, authorize, policy};
use minicrm_core::{CustomerId, Page, PageRequest};

use crate::invariants::{check_customer_create, check_customer_update};
use crate::{
    ConflictField, Customer, CustomerPatch, CustomerStore, Entity, NewCustomer, ServiceError, ServiceResult, StoreError,
};

#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn CustomerStore>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, principal: &Principal, customer: NewCustomer) -> ServiceResult<Customer> {
        authorize(principal, &policy::CREATE_CUSTOMER, None)?;
        customer.validate()?;
        check_customer_create(self.store.as_ref(), &customer).await?;

        let created = self.store.create_customer(customer).await?;
        tracing::info!(customer_id = %created.id, by = %principal.user_id, "customer created");
        Ok(created)
    }

    pub async fn list(&self, principal: &Principal, request: PageRequest) -> ServiceResult<Page<Customer>> {
        authorize(principal, &policy::LIST_CUSTOMERS, None)?;
        let (data, total) = self.store.list_customers(request.skip(), request.take()).await?;
        Ok(Page::new(request, total, data))
    }

    pub async fn get(&self, principal: &Principal, id: CustomerId) -> ServiceResult<Customer> {
        authorize(principal, &policy::GET_CUSTOMER, None)?;
        self.find(id).await
    }

    pub async fn update(&self, principal: &Principal, id: CustomerId, patch: CustomerPatch) -> ServiceResult<Customer> {
        authorize(principal, &policy::UPDATE_CUSTOMER, None)?;
        let current = self.find(id).await?;
        patch.validate()?;
        check_customer_update(self.store.as_ref(), &current, &patch).await?;

        let updated = self
            .store
            .update_customer(id, patch)
            .await?
            .ok_or(ServiceError::NotFound(Entity::Customer))?;
        tracing::info!(customer_id = %id, by = %principal.user_id, "customer updated");
        Ok(updated)
    }

    /// Permanently delete a customer. Refused with a conflict while any task
    /// still references it.
    pub async fn delete(&self, principal: &Principal, id: CustomerId) -> ServiceResult<()> {
        authorize(principal, &policy::DELETE_CUSTOMER, None)?;
        self.find(id).await?;

        let removed = match self.store.delete_customer(id).await {
            Err(StoreError::ForeignKey(detail)) => {
                tracing::warn!(customer_id = %id, %detail, "customer delete blocked by tasks");
                return Err(ServiceError::Conflict(ConflictField::HasTasks));
            }
            other => other?,
        };
        if !removed {
            return Err(ServiceError::NotFound(Entity::Customer));
        }
        tracing::info!(customer_id = %id, by = %principal.user_id, "customer deleted");
        Ok(())
    }

    async fn find(&self, id: CustomerId) -> ServiceResult<Customer> {
        self.store
            .find_customer(id)
            .await?
            .ok_or(ServiceError::NotFound(Entity::Customer))
    }
}
