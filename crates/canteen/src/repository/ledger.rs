use crate::{
    abstract_trait::{LedgerStoreTrait, LedgerTxTrait},
    domain::requests::OrderLineRecord,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use shared::{
    config::ConnectionPool,
    errors::RepositoryError,
    model::{Order, OrderItem, OrderStatus, User},
};
use sqlx::{Postgres, Transaction};
use tracing::error;

#[derive(Clone)]
pub struct PgLedgerStore {
    db: ConnectionPool,
}

impl PgLedgerStore {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerStoreTrait for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTxTrait>, RepositoryError> {
        let tx = self.db.begin().await.map_err(|e| {
            error!("❌ Failed to begin ledger transaction: {:?}", e);
            RepositoryError::from(e)
        })?;

        Ok(Box::new(PgLedgerTx { tx }))
    }
}

/// One Postgres transaction. Dropping without commit rolls back via
/// sqlx's transaction guard.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTxTrait for PgLedgerTx {
    async fn account_for_update(&mut self, user_id: i32) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, surname, patronymic, role, banned, balance,
                   subscription_start, subscription_days, registered_at
            FROM users
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to lock user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })?;

        user.ok_or(RepositoryError::NotFound)
    }

    async fn debit_balance(&mut self, user_id: i32, amount: i64) -> Result<i64, RepositoryError> {
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
            SET balance = balance - $2
            WHERE user_id = $1 AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to debit user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })?;

        balance.ok_or(RepositoryError::InsufficientFunds)
    }

    async fn credit_balance(&mut self, user_id: i32, amount: i64) -> Result<i64, RepositoryError> {
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
            SET balance = balance + $2
            WHERE user_id = $1
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to credit user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })?;

        balance.ok_or(RepositoryError::NotFound)
    }

    async fn set_subscription(
        &mut self,
        user_id: i32,
        start: Option<NaiveDateTime>,
        days: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET subscription_start = $2,
                subscription_days = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(days)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to update subscription for user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn order_for_update(&mut self, order_id: i32) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, user_id, ordered_at, completed_at, status
            FROM orders
            WHERE order_id = $1
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to lock order {}: {:?}", order_id, e);
            RepositoryError::from(e)
        })?;

        order.ok_or(RepositoryError::NotFound)
    }

    async fn order_lines(&mut self, order_id: i32) -> Result<Vec<OrderItem>, RepositoryError> {
        let lines = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT order_id, dish_id, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY dish_id
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch lines for order {}: {:?}", order_id, e);
            RepositoryError::from(e)
        })?;

        Ok(lines)
    }

    async fn lines_for_orders(
        &mut self,
        order_ids: &[i32],
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let lines = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT order_id, dish_id, quantity, unit_price
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, dish_id
            "#,
        )
        .bind(order_ids.to_vec())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch lines for {} orders: {:?}", order_ids.len(), e);
            RepositoryError::from(e)
        })?;

        Ok(lines)
    }

    async fn insert_order(
        &mut self,
        user_id: i32,
        ordered_at: NaiveDateTime,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (user_id, ordered_at, status)
            VALUES ($1, $2, 'paid')
            RETURNING order_id, user_id, ordered_at, completed_at, status
            "#,
        )
        .bind(user_id)
        .bind(ordered_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to insert order for user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })?;

        Ok(order)
    }

    async fn insert_order_lines(
        &mut self,
        order_id: i32,
        lines: &[OrderLineRecord],
    ) -> Result<(), RepositoryError> {
        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, dish_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(line.dish_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                error!(
                    "❌ Failed to insert line dish {} for order {}: {:?}",
                    line.dish_id, order_id, e
                );
                RepositoryError::from(e)
            })?;
        }

        Ok(())
    }

    async fn update_status(
        &mut self,
        order_id: i32,
        status: OrderStatus,
        completed_at: Option<NaiveDateTime>,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
            SET status = $2,
                completed_at = COALESCE($3, completed_at)
            WHERE order_id = $1
            RETURNING order_id, user_id, ordered_at, completed_at, status
            "#,
        )
        .bind(order_id)
        .bind(status)
        .bind(completed_at)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to update status of order {}: {:?}", order_id, e);
            RepositoryError::from(e)
        })?;

        order.ok_or(RepositoryError::NotFound)
    }

    async fn paid_orders_from(
        &mut self,
        user_id: i32,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, user_id, ordered_at, completed_at, status
            FROM orders
            WHERE user_id = $1 AND status = 'paid' AND ordered_at >= $2
            ORDER BY ordered_at
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(cutoff)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| {
            error!("❌ Failed to lock paid orders of user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })?;

        Ok(orders)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await.map_err(|e| {
            error!("❌ Failed to commit ledger transaction: {:?}", e);
            RepositoryError::from(e)
        })
    }
}
