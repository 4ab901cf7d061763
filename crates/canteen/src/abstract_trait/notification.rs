use async_trait::async_trait;
use shared::{
    errors::{RepositoryError, ServiceError},
    model::{Notification, UserRole},
};
use std::sync::Arc;

pub type DynNotificationCommandRepository =
    Arc<dyn NotificationCommandRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait NotificationCommandRepositoryTrait {
    async fn create(
        &self,
        user_id: Option<i32>,
        role: Option<UserRole>,
        title: &str,
        body: &str,
    ) -> Result<Notification, RepositoryError>;
}

pub type DynNotifier = Arc<dyn NotifierTrait + Send + Sync>;

/// Fire-and-forget notification sink. Callers run it after commit and
/// log failures instead of propagating them; a lost notification never
/// rolls back a ledger operation.
#[async_trait]
pub trait NotifierTrait {
    async fn notify_user(&self, user_id: i32, title: &str, body: &str)
    -> Result<(), ServiceError>;
    async fn notify_role(&self, role: UserRole, title: &str, body: &str)
    -> Result<(), ServiceError>;
}
