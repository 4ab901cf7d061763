use crate::{abstract_trait::OrderQueryRepositoryTrait, domain::requests::FindAllOrders};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use shared::{
    config::ConnectionPool,
    errors::RepositoryError,
    model::{Order, OrderItemDetail, OrderStatus},
};
use sqlx::FromRow;
use tracing::{error, info};

#[derive(Clone)]
pub struct OrderQueryRepository {
    db: ConnectionPool,
}

impl OrderQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct OrderRowWithCount {
    order_id: i32,
    user_id: i32,
    ordered_at: NaiveDateTime,
    completed_at: Option<NaiveDateTime>,
    status: OrderStatus,
    total_count: i64,
}

#[async_trait]
impl OrderQueryRepositoryTrait for OrderQueryRepository {
    async fn find_all(&self, req: &FindAllOrders) -> Result<(Vec<Order>, i64), RepositoryError> {
        info!(
            "🔍 Fetching orders | user_id: {:?}, status: {:?}",
            req.user_id, req.status
        );

        let mut conn = self.db.acquire().await.map_err(|e| {
            error!("❌ Failed to acquire DB connection: {:?}", e);
            RepositoryError::from(e)
        })?;

        let limit = req.page_size.max(1) as i64;
        let offset = ((req.page - 1).max(0) * req.page_size.max(1)) as i64;

        let rows = sqlx::query_as::<_, OrderRowWithCount>(
            r#"
            SELECT
                o.order_id,
                o.user_id,
                o.ordered_at,
                o.completed_at,
                o.status,
                COUNT(*) OVER() AS total_count
            FROM orders o
            WHERE ($1::INT IS NULL OR o.user_id = $1)
              AND ($2::order_status IS NULL OR o.status = $2)
              AND ($3::DATE IS NULL OR o.ordered_at::DATE >= $3)
              AND ($4::DATE IS NULL OR o.ordered_at::DATE <= $4)
            ORDER BY o.ordered_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(req.user_id)
        .bind(req.status)
        .bind(req.date_from)
        .bind(req.date_to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch orders: {:?}", e);
            RepositoryError::from(e)
        })?;

        let total = rows.first().map(|r| r.total_count).unwrap_or(0);

        let orders = rows
            .into_iter()
            .map(|r| Order {
                order_id: r.order_id,
                user_id: r.user_id,
                ordered_at: r.ordered_at,
                completed_at: r.completed_at,
                status: r.status,
            })
            .collect();

        Ok((orders, total))
    }

    async fn find_by_id(&self, order_id: i32) -> Result<Option<Order>, RepositoryError> {
        info!("🆔 Fetching order by ID: {}", order_id);

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, user_id, ordered_at, completed_at, status
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(RepositoryError::from)?;

        Ok(result)
    }

    async fn find_lines(&self, order_id: i32) -> Result<Vec<OrderItemDetail>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let lines = sqlx::query_as::<_, OrderItemDetail>(
            r#"
            SELECT oi.order_id, oi.dish_id, d.name AS dish_name, oi.quantity, oi.unit_price
            FROM order_items oi
            JOIN dishes d ON d.dish_id = oi.dish_id
            WHERE oi.order_id = $1
            ORDER BY oi.dish_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch lines for order {}: {:?}", order_id, e);
            RepositoryError::from(e)
        })?;

        Ok(lines)
    }
}
