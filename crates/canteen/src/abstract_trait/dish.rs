use async_trait::async_trait;
use shared::{errors::RepositoryError, model::Dish};
use std::sync::Arc;

pub type DynDishQueryRepository = Arc<dyn DishQueryRepositoryTrait + Send + Sync>;

/// Read-only catalog lookup. Menu management is another service's job.
#[async_trait]
pub trait DishQueryRepositoryTrait {
    async fn find_by_ids(&self, dish_ids: &[i32]) -> Result<Vec<Dish>, RepositoryError>;
    async fn find_by_id(&self, dish_id: i32) -> Result<Option<Dish>, RepositoryError>;
}
