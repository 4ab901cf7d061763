use crate::abstract_trait::{DynNotificationCommandRepository, NotifierTrait};
use async_trait::async_trait;
use shared::{errors::ServiceError, model::UserRole};
use tracing::info;

/// Persists notifications so clients can poll them. Callers treat
/// delivery as best-effort and never roll back on a failed insert.
pub struct NotificationService {
    command: DynNotificationCommandRepository,
}

impl NotificationService {
    pub fn new(command: DynNotificationCommandRepository) -> Self {
        Self { command }
    }
}

#[async_trait]
impl NotifierTrait for NotificationService {
    async fn notify_user(
        &self,
        user_id: i32,
        title: &str,
        body: &str,
    ) -> Result<(), ServiceError> {
        let notification = self.command.create(Some(user_id), None, title, body).await?;

        info!(
            "📤 Notification {} stored for user {}: {}",
            notification.notification_id, user_id, title
        );

        Ok(())
    }

    async fn notify_role(&self, role: UserRole, title: &str, body: &str) -> Result<(), ServiceError> {
        let notification = self.command.create(None, Some(role), title, body).await?;

        info!(
            "📤 Notification {} stored for role {:?}: {}",
            notification.notification_id, role, title
        );

        Ok(())
    }
}
