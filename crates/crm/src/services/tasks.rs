use std::sync::Arc;

use minicrm_auth::{Principal, authorize, listing_scope, policy};
use minicrm_core::{CustomerId, TaskId, UserId};

use crate::invariants::check_task_create;
use crate::{
    CustomerStore, Entity, NewTask, ServiceError, ServiceResult, TaskFilter, TaskStatus, TaskStore, TaskView, UserStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: UserId,
    pub customer_id: CustomerId,
    pub status: Option<TaskStatus>,
}

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
    customers: Arc<dyn CustomerStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>, users: Arc<dyn UserStore>, customers: Arc<dyn CustomerStore>) -> Self {
        Self { tasks, users, customers }
    }

    pub async fn create(&self, principal: &Principal, input: CreateTask) -> ServiceResult<TaskView> {
        authorize(principal, &policy::CREATE_TASK, None)?;

        let task = NewTask {
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            assignee_id: input.assigned_to,
            customer_id: input.customer_id,
        };
        task.validate()?;
        check_task_create(
            self.users.as_ref(),
            self.customers.as_ref(),
            task.assignee_id,
            task.customer_id,
        )
        .await?;

        let created = self.tasks.create_task(task).await?;
        tracing::info!(
            task_id = %created.id,
            assignee_id = %created.assigned_to.id,
            customer_id = %created.customer.id,
            "task created"
        );
        Ok(created)
    }

    /// Admins see every task; employees only those assigned to them.
    pub async fn list(&self, principal: &Principal) -> ServiceResult<Vec<TaskView>> {
        let scope = listing_scope(principal, &policy::LIST_TASKS)?;
        Ok(self.tasks.list_tasks(TaskFilter::from(scope)).await?)
    }

    pub async fn update_status(&self, principal: &Principal, id: TaskId, status: TaskStatus) -> ServiceResult<TaskView> {
        authorize(principal, &policy::UPDATE_TASK_STATUS, None)?;

        let task = self
            .tasks
            .find_task(id)
            .await?
            .ok_or(ServiceError::NotFound(Entity::Task))?;
        authorize(principal, &policy::UPDATE_TASK_STATUS, Some(task.assignee_id))?;

        let updated = self
            .tasks
            .update_task_status(id, status)
            .await?
            .ok_or(ServiceError::NotFound(Entity::Task))?;
        tracing::info!(task_id = %id, status = %status, by = %principal.user_id, "task status updated");
        Ok(updated)
    }
}
