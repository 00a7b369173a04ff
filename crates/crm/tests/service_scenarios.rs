use std::sync::Arc;

use chrono::{Duration, Utc};

use minicrm_auth::{CredentialIssuer, Hs256CredentialIssuer, PasswordError, PasswordHasher, Principal, Role};
use minicrm_core::{CustomerId, PageRequest, TaskId, UserId};
use minicrm_crm::services::{CreateTask, Registration, Services};
use minicrm_crm::{ConflictField, CustomerPatch, Entity, NewCustomer, ServiceError, TaskStatus, UserStore};
use minicrm_infra::InMemoryStore;

struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        Ok(format!("plain${secret}"))
    }

    fn verify(&self, secret: &str, hash: &str) -> Result<bool, PasswordError> {
        Ok(hash == format!("plain${secret}"))
    }
}

struct Fixture {
    store: Arc<InMemoryStore>,
    issuer: Arc<Hs256CredentialIssuer>,
    services: Services,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let issuer = Arc::new(Hs256CredentialIssuer::new(b"scenario-secret".to_vec(), Duration::hours(1)));
        let services = Services::new(store.clone(), Arc::new(PlainHasher), issuer.clone());
        Self { store, issuer, services }
    }

    async fn user(&self, name: &str, role: Role) -> Principal {
        let user = self
            .services
            .auth
            .register(Registration {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password: "password123".to_string(),
                role,
            })
            .await
            .unwrap();
        Principal::new(user.id, user.role)
    }

    async fn customer(&self, admin: &Principal, email: &str, phone: &str) -> Result<CustomerId, ServiceError> {
        self.services
            .customers
            .create(admin, new_customer(email, phone))
            .await
            .map(|c| c.id)
    }

    async fn task(&self, admin: &Principal, assignee: UserId, customer: CustomerId) -> Result<TaskId, ServiceError> {
        self.services
            .tasks
            .create(
                admin,
                CreateTask {
                    title: "Follow up".to_string(),
                    description: None,
                    assigned_to: assignee,
                    customer_id: customer,
                    status: None,
                },
            )
            .await
            .map(|t| t.id)
    }
}

fn new_customer(email: &str, phone: &str) -> NewCustomer {
    NewCustomer {
        name: "Acme".to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        company: None,
    }
}

#[tokio::test]
async fn status_update_is_gated_by_assignment() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", Role::Admin).await;
    let first = fx.user("First", Role::Employee).await;
    let second = fx.user("Second", Role::Employee).await;
    let customer = fx.customer(&admin, "a@x.com", "1").await.unwrap();
    let task = fx.task(&admin, first.user_id, customer).await.unwrap();

    let err = fx
        .services
        .tasks
        .update_status(&second, task, TaskStatus::Done)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let updated = fx.services.tasks.update_status(&first, task, TaskStatus::Done).await.unwrap();
    assert_eq!(updated.status, TaskStatus::Done);

    // An admin that is not the assignee (and not even a stored user) may still update.
    let outsider_admin = Principal::new(UserId::new(99), Role::Admin);
    let updated = fx
        .services
        .tasks
        .update_status(&outsider_admin, task, TaskStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(updated.status, TaskStatus::InProgress);
}

#[tokio::test]
async fn assignee_can_set_every_status() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", Role::Admin).await;
    let owner = fx.user("Owner", Role::Employee).await;
    let customer = fx.customer(&admin, "a@x.com", "1").await.unwrap();
    let task = fx.task(&admin, owner.user_id, customer).await.unwrap();

    for status in TaskStatus::ALL.into_iter().rev() {
        let updated = fx.services.tasks.update_status(&owner, task, status).await.unwrap();
        assert_eq!(updated.status, status);
        assert!(updated.updated_at >= updated.created_at);
    }
}

#[tokio::test]
async fn missing_task_is_not_found_before_ownership() {
    let fx = Fixture::new();
    let employee = fx.user("Emp", Role::Employee).await;

    let err = fx
        .services
        .tasks
        .update_status(&employee, TaskId::new(404), TaskStatus::Done)
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::NotFound(Entity::Task));
}

#[tokio::test]
async fn duplicate_customer_email_conflicts() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", Role::Admin).await;

    fx.customer(&admin, "a@x.com", "1").await.unwrap();
    assert_eq!(
        fx.customer(&admin, "a@x.com", "2").await.unwrap_err(),
        ServiceError::Conflict(ConflictField::Email)
    );
    assert_eq!(
        fx.customer(&admin, "b@x.com", "1").await.unwrap_err(),
        ServiceError::Conflict(ConflictField::Phone)
    );
    assert!(fx.customer(&admin, "b@x.com", "2").await.is_ok());

    // Phone clashes with one record, email with another.
    assert_eq!(
        fx.customer(&admin, "b@x.com", "1").await.unwrap_err(),
        ServiceError::Conflict(ConflictField::Duplicate)
    );
    // A single record matching both fields reports email.
    assert_eq!(
        fx.customer(&admin, "a@x.com", "1").await.unwrap_err(),
        ServiceError::Conflict(ConflictField::Email)
    );
}

#[tokio::test]
async fn updating_to_own_email_never_conflicts() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", Role::Admin).await;
    let id = fx.customer(&admin, "a@x.com", "1").await.unwrap();
    fx.customer(&admin, "b@x.com", "2").await.unwrap();

    let patch = CustomerPatch {
        email: Some("a@x.com".to_string()),
        phone: Some("1".to_string()),
        ..Default::default()
    };
    assert!(fx.services.customers.update(&admin, id, patch).await.is_ok());

    let stealing = CustomerPatch {
        phone: Some("2".to_string()),
        ..Default::default()
    };
    assert_eq!(
        fx.services.customers.update(&admin, id, stealing).await.unwrap_err(),
        ServiceError::Conflict(ConflictField::Phone)
    );
}

#[tokio::test]
async fn updating_a_missing_customer_is_not_found_before_uniqueness() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", Role::Admin).await;
    fx.customer(&admin, "a@x.com", "1").await.unwrap();

    let patch = CustomerPatch {
        email: Some("a@x.com".to_string()),
        ..Default::default()
    };
    assert_eq!(
        fx.services.customers.update(&admin, CustomerId::new(77), patch).await.unwrap_err(),
        ServiceError::NotFound(Entity::Customer)
    );
}

#[tokio::test]
async fn employees_list_only_their_own_tasks() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", Role::Admin).await;
    let first = fx.user("First", Role::Employee).await;
    let second = fx.user("Second", Role::Employee).await;
    let customer = fx.customer(&admin, "a@x.com", "1").await.unwrap();

    for assignee in [first.user_id, second.user_id, first.user_id] {
        fx.task(&admin, assignee, customer).await.unwrap();
    }

    let mine = fx.services.tasks.list(&first).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|t| t.assigned_to.id == first.user_id));

    assert_eq!(fx.services.tasks.list(&admin).await.unwrap().len(), 3);
}

#[tokio::test]
async fn admin_assignee_is_invalid_input_not_not_found() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", Role::Admin).await;
    let customer = fx.customer(&admin, "a@x.com", "1").await.unwrap();

    let err = fx.task(&admin, admin.user_id, customer).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    // Missing customer is reported only after the assignee checks pass.
    let err = fx.task(&admin, admin.user_id, CustomerId::new(500)).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn task_creation_reports_missing_references() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", Role::Admin).await;
    let employee = fx.user("Emp", Role::Employee).await;
    let customer = fx.customer(&admin, "a@x.com", "1").await.unwrap();

    assert_eq!(
        fx.task(&admin, UserId::new(404), customer).await.unwrap_err(),
        ServiceError::NotFound(Entity::Assignee)
    );
    // With both references missing the assignee is reported first.
    assert_eq!(
        fx.task(&admin, UserId::new(404), CustomerId::new(404)).await.unwrap_err(),
        ServiceError::NotFound(Entity::Assignee)
    );
    assert_eq!(
        fx.task(&admin, employee.user_id, CustomerId::new(404)).await.unwrap_err(),
        ServiceError::NotFound(Entity::Customer)
    );
    assert!(matches!(
        fx.task(&employee, employee.user_id, customer).await.unwrap_err(),
        ServiceError::Forbidden(_)
    ));
}

#[tokio::test]
async fn customer_listing_pages_newest_first() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", Role::Admin).await;
    for n in 1..=3 {
        fx.customer(&admin, &format!("c{n}@x.com"), &n.to_string()).await.unwrap();
    }

    let page = fx
        .services
        .customers
        .list(&admin, PageRequest::normalized(Some(1), Some(2)))
        .await
        .unwrap();
    assert_eq!(page.total_records, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].email, "c3@x.com");

    let last = fx
        .services
        .customers
        .list(&admin, PageRequest::normalized(Some(2), Some(2)))
        .await
        .unwrap();
    assert_eq!(last.data.len(), 1);
    assert_eq!(last.data[0].email, "c1@x.com");
}

#[tokio::test]
async fn deleting_a_customer_with_tasks_is_a_conflict() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", Role::Admin).await;
    let employee = fx.user("Emp", Role::Employee).await;
    let customer = fx.customer(&admin, "a@x.com", "1").await.unwrap();
    fx.task(&admin, employee.user_id, customer).await.unwrap();

    let err = fx.services.customers.delete(&admin, customer).await.unwrap_err();
    assert_eq!(err, ServiceError::Conflict(ConflictField::HasTasks));
    assert!(fx.services.customers.get(&admin, customer).await.is_ok());

    let spare = fx.customer(&admin, "b@x.com", "2").await.unwrap();
    fx.services.customers.delete(&admin, spare).await.unwrap();
    assert_eq!(
        fx.services.customers.get(&admin, spare).await.unwrap_err(),
        ServiceError::NotFound(Entity::Customer)
    );
}

#[tokio::test]
async fn register_then_login_issues_a_usable_credential() {
    let fx = Fixture::new();
    let employee = fx.user("Ada", Role::Employee).await;

    let stored = fx.store.find_user(employee.user_id).await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "password123");

    let now = Utc::now();
    let login = fx.services.auth.login("ada@example.com", "password123", now).await.unwrap();
    assert_eq!(login.user.id, employee.user_id);
    assert_eq!(login.user.role, Role::Employee);

    let principal = fx.services.auth.authenticate(Some(login.access_token.as_str()), now).unwrap();
    assert_eq!(principal, employee);

    let claims = fx.issuer.parse(&login.access_token, now).unwrap();
    assert_eq!(claims.expires_at - claims.issued_at, Duration::hours(1));

    let later = now + Duration::hours(2);
    assert!(matches!(
        fx.services.auth.authenticate(Some(login.access_token.as_str()), later),
        Err(ServiceError::Unauthenticated(_))
    ));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let fx = Fixture::new();
    fx.user("Ada", Role::Employee).await;
    let now = Utc::now();

    let wrong_password = fx.services.auth.login("ada@example.com", "nope-nope", now).await.unwrap_err();
    let unknown_email = fx.services.auth.login("eve@example.com", "password123", now).await.unwrap_err();
    assert_eq!(wrong_password, unknown_email);
    assert!(matches!(wrong_password, ServiceError::Unauthenticated(_)));
}

#[tokio::test]
async fn registration_rules() {
    let fx = Fixture::new();
    fx.user("Ada", Role::Employee).await;

    let duplicate = fx
        .services
        .auth
        .register(Registration {
            name: "Other Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "password123".to_string(),
            role: Role::Admin,
        })
        .await
        .unwrap_err();
    assert_eq!(duplicate, ServiceError::Conflict(ConflictField::Email));

    let short = fx
        .services
        .auth
        .register(Registration {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "short".to_string(),
            role: Role::Employee,
        })
        .await
        .unwrap_err();
    assert!(matches!(short, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn role_changes_are_admin_only_overwrites() {
    let fx = Fixture::new();
    let admin = fx.user("Admin", Role::Admin).await;
    let employee = fx.user("Emp", Role::Employee).await;

    assert!(matches!(
        fx.services.users.list(&employee).await.unwrap_err(),
        ServiceError::Forbidden(_)
    ));

    let promoted = fx
        .services
        .users
        .update_role(&admin, employee.user_id, Role::Admin)
        .await
        .unwrap();
    assert_eq!(promoted.role, Role::Admin);
    assert_eq!(
        fx.services.users.get(&admin, UserId::new(404)).await.unwrap_err(),
        ServiceError::NotFound(Entity::User)
    );
    assert_eq!(fx.services.users.list(&admin).await.unwrap().len(), 2);
}
