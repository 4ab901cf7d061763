use crate::abstract_trait::DishQueryRepositoryTrait;
use async_trait::async_trait;
use shared::{config::ConnectionPool, errors::RepositoryError, model::Dish};
use tracing::error;

#[derive(Clone)]
pub struct DishQueryRepository {
    db: ConnectionPool,
}

impl DishQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DishQueryRepositoryTrait for DishQueryRepository {
    async fn find_by_ids(&self, dish_ids: &[i32]) -> Result<Vec<Dish>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(|e| {
            error!("❌ Failed to acquire DB connection: {:?}", e);
            RepositoryError::from(e)
        })?;

        let dishes = sqlx::query_as::<_, Dish>(
            r#"
            SELECT dish_id, name, price
            FROM dishes
            WHERE dish_id = ANY($1)
            ORDER BY dish_id
            "#,
        )
        .bind(dish_ids.to_vec())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch dishes: {:?}", e);
            RepositoryError::from(e)
        })?;

        Ok(dishes)
    }

    async fn find_by_id(&self, dish_id: i32) -> Result<Option<Dish>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let dish = sqlx::query_as::<_, Dish>(
            r#"
            SELECT dish_id, name, price
            FROM dishes
            WHERE dish_id = $1
            "#,
        )
        .bind(dish_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(RepositoryError::from)?;

        Ok(dish)
    }
}
