//! Postgres-backed CRM store.
//!
//! The schema lives in `migrations/0001_init.sql` and is applied by
//! [`PostgresStore::migrate`]. Unique and foreign-key constraints in the schema
//! are the authoritative backstop for the service-level pre-checks.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` |
//! | Database (foreign key violation) | `23503` | `ForeignKey` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` |
//! | Other | N/A | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use minicrm_auth::Role;
use minicrm_core::{CustomerId, TaskId, UserId};
use minicrm_crm::{
    AssigneeSummary, Customer, CustomerPatch, CustomerStore, CustomerSummary, NewCustomer, NewTask, NewUser,
    StoreError, StoreResult, Task, TaskFilter, TaskStatus, TaskStore, TaskView, UniqueFields, User, UserStore,
};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";
const CUSTOMER_COLUMNS: &str = "id, name, email, phone, company, created_at";

const TASK_VIEW_SELECT: &str = r#"
    SELECT
        t.id, t.title, t.description, t.status, t.created_at, t.updated_at,
        u.id    AS assignee_id,
        u.name  AS assignee_name,
        u.email AS assignee_email,
        c.id    AS customer_id,
        c.name  AS customer_name,
        c.email AS customer_email,
        c.phone AS customer_phone
    FROM tasks t
    JOIN users u ON u.id = t.assignee_id
    JOIN customers c ON c.id = t.customer_id
"#;

/// Relational store over a shared SQLx connection pool.
///
/// `Send + Sync`; every method is a single bounded round trip (or two for
/// writes that return a joined view).
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Connect a pool to `database_url`.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the schema. Idempotent.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn fetch_task_view(&self, id: i64) -> StoreResult<Option<TaskView>> {
        let row = sqlx::query(&format!("{TASK_VIEW_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_task_view", e))?;
        row.as_ref().map(task_view_from_row).transpose()
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, user), err)]
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;
        user_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn update_user_role(&self, id: UserId, role: Role) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"))
            .bind(id.get())
            .bind(role.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_user_role", e))?;
        row.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl CustomerStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn find_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(&format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_customer", e))?;
        row.as_ref().map(customer_from_row).transpose()
    }

    #[instrument(skip(self, fields), err)]
    async fn find_customers_by_unique_fields(
        &self,
        fields: UniqueFields<'_>,
        exclude: Option<CustomerId>,
    ) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE ($1::bigint IS NULL OR id <> $1)
              AND (($2::text IS NOT NULL AND email = $2) OR ($3::text IS NOT NULL AND phone = $3))
            ORDER BY id ASC
            "#
        ))
        .bind(exclude.map(CustomerId::get))
        .bind(fields.email)
        .bind(fields.phone)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_customers_by_unique_fields", e))?;
        rows.iter().map(customer_from_row).collect()
    }

    #[instrument(skip(self, customer), err)]
    async fn create_customer(&self, customer: NewCustomer) -> StoreResult<Customer> {
        let row = sqlx::query(&format!(
            "INSERT INTO customers (name, email, phone, company) VALUES ($1, $2, $3, $4) RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.company.as_deref())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_customer", e))?;
        customer_from_row(&row)
    }

    #[instrument(skip(self, patch), err)]
    async fn update_customer(&self, id: CustomerId, patch: CustomerPatch) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE customers SET
                name    = COALESCE($2, name),
                email   = COALESCE($3, email),
                phone   = COALESCE($4, phone),
                company = COALESCE($5, company)
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(patch.name.as_deref())
        .bind(patch.email.as_deref())
        .bind(patch.phone.as_deref())
        .bind(patch.company.as_deref())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_customer", e))?;
        row.as_ref().map(customer_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_customer(&self, id: CustomerId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_customer", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list_customers(&self, skip: u64, take: u64) -> StoreResult<(Vec<Customer>, u64)> {
        let count_row = sqlx::query("SELECT COUNT(*) AS total FROM customers")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_customers", e))?;
        let total: i64 = count_row.try_get("total").map_err(decode_error)?;

        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at DESC, id DESC OFFSET $1 LIMIT $2"
        ))
        .bind(to_i64(skip))
        .bind(to_i64(take))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_customers", e))?;

        let customers = rows.iter().map(customer_from_row).collect::<StoreResult<Vec<_>>>()?;
        Ok((customers, u64::try_from(total).unwrap_or(0)))
    }
}

#[async_trait]
impl TaskStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, status, assignee_id, customer_id, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_task", e))?;
        row.as_ref().map(task_from_row).transpose()
    }

    #[instrument(skip(self, task), err)]
    async fn create_task(&self, task: NewTask) -> StoreResult<TaskView> {
        let row = sqlx::query(
            r#"
            INSERT INTO tasks (title, description, status, assignee_id, customer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.status.as_str())
        .bind(task.assignee_id.get())
        .bind(task.customer_id.get())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_task", e))?;
        let id: i64 = row.try_get("id").map_err(decode_error)?;

        self.fetch_task_view(id)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("task {id} vanished after insert")))
    }

    #[instrument(skip(self), err)]
    async fn update_task_status(&self, id: TaskId, status: TaskStatus) -> StoreResult<Option<TaskView>> {
        let updated = sqlx::query("UPDATE tasks SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.get())
            .bind(status.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_task_status", e))?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_task_view(id.get()).await
    }

    #[instrument(skip(self), err)]
    async fn list_tasks(&self, filter: TaskFilter) -> StoreResult<Vec<TaskView>> {
        let rows = sqlx::query(&format!(
            "{TASK_VIEW_SELECT} WHERE ($1::bigint IS NULL OR t.assignee_id = $1) ORDER BY t.created_at DESC, t.id DESC"
        ))
        .bind(filter.assignee.map(UserId::get))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tasks", e))?;
        rows.iter().map(task_view_from_row).collect()
    }
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: String = row.try_get("role").map_err(decode_error)?;
    Ok(User {
        id: UserId::new(row.try_get("id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        email: row.try_get("email").map_err(decode_error)?,
        password_hash: row.try_get("password_hash").map_err(decode_error)?,
        role: role.parse().map_err(|e| StoreError::Backend(format!("{e}")))?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode_error)?,
    })
}

fn customer_from_row(row: &PgRow) -> StoreResult<Customer> {
    Ok(Customer {
        id: CustomerId::new(row.try_get("id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        email: row.try_get("email").map_err(decode_error)?,
        phone: row.try_get("phone").map_err(decode_error)?,
        company: row.try_get("company").map_err(decode_error)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode_error)?,
    })
}

fn task_from_row(row: &PgRow) -> StoreResult<Task> {
    Ok(Task {
        id: TaskId::new(row.try_get("id").map_err(decode_error)?),
        title: row.try_get("title").map_err(decode_error)?,
        description: row.try_get("description").map_err(decode_error)?,
        status: status_from_row(row)?,
        assignee_id: UserId::new(row.try_get("assignee_id").map_err(decode_error)?),
        customer_id: CustomerId::new(row.try_get("customer_id").map_err(decode_error)?),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode_error)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(decode_error)?,
    })
}

fn task_view_from_row(row: &PgRow) -> StoreResult<TaskView> {
    Ok(TaskView {
        id: TaskId::new(row.try_get("id").map_err(decode_error)?),
        title: row.try_get("title").map_err(decode_error)?,
        description: row.try_get("description").map_err(decode_error)?,
        status: status_from_row(row)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode_error)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(decode_error)?,
        assigned_to: AssigneeSummary {
            id: UserId::new(row.try_get("assignee_id").map_err(decode_error)?),
            name: row.try_get("assignee_name").map_err(decode_error)?,
            email: row.try_get("assignee_email").map_err(decode_error)?,
        },
        customer: CustomerSummary {
            id: CustomerId::new(row.try_get("customer_id").map_err(decode_error)?),
            name: row.try_get("customer_name").map_err(decode_error)?,
            email: row.try_get("customer_email").map_err(decode_error)?,
            phone: row.try_get("customer_phone").map_err(decode_error)?,
        },
    })
}

fn status_from_row(row: &PgRow) -> StoreResult<TaskStatus> {
    let status: String = row.try_get("status").map_err(decode_error)?;
    status.parse().map_err(|e| StoreError::Backend(format!("{e}")))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("row decode failed: {err}"))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(db_err.constraint().map(str::to_string).unwrap_or(msg)),
                Some("23503") => StoreError::ForeignKey(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}
