use crate::abstract_trait::UserQueryRepositoryTrait;
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError, model::User};
use tracing::error;

#[derive(Clone)]
pub struct UserQueryRepository {
    db: ConnectionPool,
}

impl UserQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserQueryRepositoryTrait for UserQueryRepository {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(|e| {
            error!("❌ Failed to acquire DB connection: {:?}", e);
            RepositoryError::from(e)
        })?;

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, surname, patronymic, role, banned, balance,
                   subscription_start, subscription_days, registered_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })?;

        Ok(user)
    }
}
