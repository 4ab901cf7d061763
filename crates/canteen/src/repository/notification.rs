use crate::abstract_trait::NotificationCommandRepositoryTrait;
use async_trait::async_trait;
use shared::{
    config::ConnectionPool,
    errors::RepositoryError,
    model::{Notification, UserRole},
};
use tracing::error;

#[derive(Clone)]
pub struct NotificationCommandRepository {
    db: ConnectionPool,
}

impl NotificationCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationCommandRepositoryTrait for NotificationCommandRepository {
    async fn create(
        &self,
        user_id: Option<i32>,
        role: Option<UserRole>,
        title: &str,
        body: &str,
    ) -> Result<Notification, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(|e| {
            error!("❌ Failed to acquire DB connection: {:?}", e);
            RepositoryError::from(e)
        })?;

        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, role, title, body)
            VALUES ($1, $2, $3, $4)
            RETURNING notification_id, user_id, role, title, body, read, created_at
            "#,
        )
        .bind(user_id)
        .bind(role)
        .bind(title)
        .bind(body)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to insert notification: {:?}", e);
            RepositoryError::from(e)
        })?;

        Ok(notification)
    }
}
