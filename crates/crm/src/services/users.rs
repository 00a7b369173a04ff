use std::sync::Arc;

use minicrm_auth::{Principal, Role, authorize, policy};
use minicrm_core::UserId;

use crate::{Entity, PublicUser, ServiceError, ServiceResult, UserStore};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn list(&self, principal: &Principal) -> ServiceResult<Vec<PublicUser>> {
        authorize(principal, &policy::LIST_USERS, None)?;
        let users = self.users.list_users().await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    pub async fn get(&self, principal: &Principal, id: UserId) -> ServiceResult<PublicUser> {
        authorize(principal, &policy::GET_USER, None)?;
        self.users
            .find_user(id)
            .await?
            .map(PublicUser::from)
            .ok_or(ServiceError::NotFound(Entity::User))
    }

    /// Overwrite a user's role. Tasks already assigned to the user are kept.
    pub async fn update_role(&self, principal: &Principal, id: UserId, role: Role) -> ServiceResult<PublicUser> {
        authorize(principal, &policy::UPDATE_USER_ROLE, None)?;
        let updated = self
            .users
            .update_user_role(id, role)
            .await?
            .ok_or(ServiceError::NotFound(Entity::User))?;

        tracing::info!(user_id = %id, role = %role, by = %principal.user_id, "user role updated");
        Ok(updated.into())
    }
}
