use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use minicrm_auth::Role;
use minicrm_core::{CustomerId, TaskId, UserId};
use minicrm_crm::{
    AssigneeSummary, Customer, CustomerPatch, CustomerStore, CustomerSummary, NewCustomer, NewTask, NewUser,
    StoreError, StoreResult, Task, TaskFilter, TaskStatus, TaskStore, TaskView, UniqueFields, User, UserStore,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    customers: BTreeMap<CustomerId, Customer>,
    tasks: BTreeMap<TaskId, Task>,
    last_user_id: i64,
    last_customer_id: i64,
    last_task_id: i64,
}

impl Tables {
    fn customer_clash(&self, email: &str, phone: &str, exclude: Option<CustomerId>) -> Option<&'static str> {
        let others = self.customers.values().filter(|c| Some(c.id) != exclude);
        let mut clash = None;
        for c in others {
            if c.email == email {
                return Some("customers.email");
            }
            if c.phone == phone {
                clash = Some("customers.phone");
            }
        }
        clash
    }

    fn view(&self, task: &Task) -> StoreResult<TaskView> {
        let assignee = self
            .users
            .get(&task.assignee_id)
            .ok_or_else(|| StoreError::Backend(format!("task {} references missing user", task.id)))?;
        let customer = self
            .customers
            .get(&task.customer_id)
            .ok_or_else(|| StoreError::Backend(format!("task {} references missing customer", task.id)))?;

        Ok(TaskView {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            created_at: task.created_at,
            updated_at: task.updated_at,
            assigned_to: AssigneeSummary {
                id: assignee.id,
                name: assignee.name.clone(),
                email: assignee.email.clone(),
            },
            customer: CustomerSummary {
                id: customer.id,
                name: customer.name.clone(),
                email: customer.email.clone(),
                phone: customer.phone.clone(),
            },
        })
    }
}

/// In-memory store for tests/dev.
///
/// Mirrors the relational schema's constraints: unique user email, unique
/// customer email and phone, and restricted deletes for referenced customers.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users.email".to_string()));
        }

        tables.last_user_id += 1;
        let created = User {
            id: UserId::new(tables.last_user_id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    async fn update_user_role(&self, id: UserId, role: Role) -> StoreResult<Option<User>> {
        let mut tables = self.write()?;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }
}

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn find_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        Ok(self.read()?.customers.get(&id).cloned())
    }

    async fn find_customers_by_unique_fields(
        &self,
        fields: UniqueFields<'_>,
        exclude: Option<CustomerId>,
    ) -> StoreResult<Vec<Customer>> {
        let tables = self.read()?;
        let found = tables
            .customers
            .values()
            .filter(|c| Some(c.id) != exclude)
            .filter(|c| fields.email == Some(c.email.as_str()) || fields.phone == Some(c.phone.as_str()))
            .cloned()
            .collect();
        Ok(found)
    }

    async fn create_customer(&self, customer: NewCustomer) -> StoreResult<Customer> {
        let mut tables = self.write()?;
        if let Some(constraint) = tables.customer_clash(&customer.email, &customer.phone, None) {
            return Err(StoreError::UniqueViolation(constraint.to_string()));
        }

        tables.last_customer_id += 1;
        let created = Customer {
            id: CustomerId::new(tables.last_customer_id),
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            company: customer.company,
            created_at: Utc::now(),
        };
        tables.customers.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_customer(&self, id: CustomerId, patch: CustomerPatch) -> StoreResult<Option<Customer>> {
        let mut tables = self.write()?;
        let Some(mut updated) = tables.customers.get(&id).cloned() else {
            return Ok(None);
        };
        patch.apply_to(&mut updated);

        if let Some(constraint) = tables.customer_clash(&updated.email, &updated.phone, Some(id)) {
            return Err(StoreError::UniqueViolation(constraint.to_string()));
        }
        tables.customers.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_customer(&self, id: CustomerId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if tables.tasks.values().any(|t| t.customer_id == id) {
            return Err(StoreError::ForeignKey(format!("customer {id} is referenced by tasks")));
        }
        Ok(tables.customers.remove(&id).is_some())
    }

    async fn list_customers(&self, skip: u64, take: u64) -> StoreResult<(Vec<Customer>, u64)> {
        let tables = self.read()?;
        let mut all: Vec<&Customer> = tables.customers.values().collect();
        all.sort_by_key(|c| Reverse((c.created_at, c.id)));

        let total = all.len() as u64;
        let page = all
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(take).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn create_task(&self, task: NewTask) -> StoreResult<TaskView> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&task.assignee_id) {
            return Err(StoreError::ForeignKey(format!("user {} does not exist", task.assignee_id)));
        }
        if !tables.customers.contains_key(&task.customer_id) {
            return Err(StoreError::ForeignKey(format!("customer {} does not exist", task.customer_id)));
        }

        tables.last_task_id += 1;
        let now = Utc::now();
        let created = Task {
            id: TaskId::new(tables.last_task_id),
            title: task.title,
            description: task.description,
            status: task.status,
            assignee_id: task.assignee_id,
            customer_id: task.customer_id,
            created_at: now,
            updated_at: now,
        };
        let view = tables.view(&created)?;
        tables.tasks.insert(created.id, created);
        Ok(view)
    }

    async fn update_task_status(&self, id: TaskId, status: TaskStatus) -> StoreResult<Option<TaskView>> {
        let mut tables = self.write()?;
        let Some(task) = tables.tasks.get_mut(&id) else {
            return Ok(None);
        };
        task.status = status;
        task.updated_at = Utc::now();

        let task = task.clone();
        tables.view(&task).map(Some)
    }

    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<TaskView>> {
        let tables = self.read()?;
        let mut matching: Vec<&Task> = tables
            .tasks
            .values()
            .filter(|t| filter.assignee.is_none_or(|a| t.assignee_id == a))
            .collect();
        matching.sort_by_key(|t| Reverse((t.created_at, t.id)));

        matching.into_iter().map(|t| tables.view(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: "Someone".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role,
        }
    }

    fn new_customer(email: &str, phone: &str) -> NewCustomer {
        NewCustomer {
            name: "Acme".into(),
            email: email.into(),
            phone: phone.into(),
            company: None,
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let store = InMemoryStore::new();
        let a = store.create_user(new_user("a@x.com", Role::Admin)).await.unwrap();
        let b = store.create_user(new_user("b@x.com", Role::Employee)).await.unwrap();
        assert_eq!((a.id.get(), b.id.get()), (1, 2));
    }

    #[tokio::test]
    async fn unique_constraints_back_up_the_precheck() {
        let store = InMemoryStore::new();
        store.create_customer(new_customer("a@x.com", "1")).await.unwrap();

        let err = store.create_customer(new_customer("b@x.com", "1")).await.unwrap_err();
        assert_eq!(err, StoreError::UniqueViolation("customers.phone".into()));

        store.create_user(new_user("a@x.com", Role::Admin)).await.unwrap();
        let err = store.create_user(new_user("a@x.com", Role::Admin)).await.unwrap_err();
        assert_eq!(err, StoreError::UniqueViolation("users.email".into()));
    }

    #[tokio::test]
    async fn unique_field_lookup_skips_the_excluded_record() {
        let store = InMemoryStore::new();
        let c = store.create_customer(new_customer("a@x.com", "1")).await.unwrap();
        let fields = UniqueFields {
            email: Some("a@x.com"),
            phone: None,
        };

        assert_eq!(store.find_customers_by_unique_fields(fields, None).await.unwrap().len(), 1);
        assert!(store.find_customers_by_unique_fields(fields, Some(c.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unique_field_lookup_returns_every_clashing_record() {
        let store = InMemoryStore::new();
        let a = store.create_customer(new_customer("a@x.com", "1")).await.unwrap();
        let b = store.create_customer(new_customer("b@x.com", "2")).await.unwrap();
        store.create_customer(new_customer("c@x.com", "3")).await.unwrap();
        let fields = UniqueFields {
            email: Some("b@x.com"),
            phone: Some("1"),
        };

        let ids: Vec<_> = store
            .find_customers_by_unique_fields(fields, None)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn customer_pages_are_newest_first() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store
                .create_customer(new_customer(&format!("c{i}@x.com"), &i.to_string()))
                .await
                .unwrap();
        }

        let (page, total) = store.list_customers(1, 2).await.unwrap();
        assert_eq!(total, 5);
        let ids: Vec<i64> = page.iter().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[tokio::test]
    async fn referenced_customers_cannot_be_deleted() {
        let store = InMemoryStore::new();
        let employee = store.create_user(new_user("e@x.com", Role::Employee)).await.unwrap();
        let customer = store.create_customer(new_customer("a@x.com", "1")).await.unwrap();
        store
            .create_task(NewTask {
                title: "Follow up".into(),
                description: None,
                status: TaskStatus::Open,
                assignee_id: employee.id,
                customer_id: customer.id,
            })
            .await
            .unwrap();

        assert!(matches!(
            store.delete_customer(customer.id).await,
            Err(StoreError::ForeignKey(_))
        ));
        assert!(store.find_customer(customer.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn task_listing_filters_by_assignee() {
        let store = InMemoryStore::new();
        let e1 = store.create_user(new_user("e1@x.com", Role::Employee)).await.unwrap();
        let e2 = store.create_user(new_user("e2@x.com", Role::Employee)).await.unwrap();
        let customer = store.create_customer(new_customer("a@x.com", "1")).await.unwrap();
        for assignee in [e1.id, e2.id, e1.id] {
            store
                .create_task(NewTask {
                    title: "t".into(),
                    description: None,
                    status: TaskStatus::Open,
                    assignee_id: assignee,
                    customer_id: customer.id,
                })
                .await
                .unwrap();
        }

        let mine = store
            .list_tasks(TaskFilter {
                assignee: Some(e1.id),
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|t| t.assigned_to.id == e1.id));
        assert_eq!(store.list_tasks(TaskFilter::default()).await.unwrap().len(), 3);
    }
}
