use crate::domain::requests::FindAllOrders;
use async_trait::async_trait;
use shared::{
    errors::RepositoryError,
    model::{Order, OrderItemDetail},
};
use std::sync::Arc;

pub type DynOrderQueryRepository = Arc<dyn OrderQueryRepositoryTrait + Send + Sync>;

/// Read side. All writes go through the ledger store so they are always
/// transactional.
#[async_trait]
pub trait OrderQueryRepositoryTrait {
    async fn find_all(&self, req: &FindAllOrders) -> Result<(Vec<Order>, i64), RepositoryError>;
    async fn find_by_id(&self, order_id: i32) -> Result<Option<Order>, RepositoryError>;
    async fn find_lines(&self, order_id: i32) -> Result<Vec<OrderItemDetail>, RepositoryError>;
}
