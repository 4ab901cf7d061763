use crate::domain::requests::OrderLineRecord;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use shared::{
    errors::RepositoryError,
    model::{Order, OrderItem, OrderStatus, User},
};
use std::sync::Arc;

pub type DynLedgerStore = Arc<dyn LedgerStoreTrait + Send + Sync>;

/// Hands out one transaction per mutating ledger operation. Every money
/// move and every status flip of an order happens inside exactly one
/// `LedgerTxTrait`; there is no ambient session.
#[async_trait]
pub trait LedgerStoreTrait {
    async fn begin(&self) -> Result<Box<dyn LedgerTxTrait>, RepositoryError>;
}

/// A single ledger transaction. `*_for_update` fetches take row locks
/// held until commit; dropping the transaction without committing rolls
/// everything back.
#[async_trait]
pub trait LedgerTxTrait: Send {
    async fn account_for_update(&mut self, user_id: i32) -> Result<User, RepositoryError>;

    /// Atomic guarded debit. Fails with `InsufficientFunds` when the
    /// balance would go negative; returns the new balance otherwise.
    async fn debit_balance(&mut self, user_id: i32, amount: i64) -> Result<i64, RepositoryError>;

    async fn credit_balance(&mut self, user_id: i32, amount: i64) -> Result<i64, RepositoryError>;

    async fn set_subscription(
        &mut self,
        user_id: i32,
        start: Option<NaiveDateTime>,
        days: i32,
    ) -> Result<(), RepositoryError>;

    async fn order_for_update(&mut self, order_id: i32) -> Result<Order, RepositoryError>;

    async fn order_lines(&mut self, order_id: i32) -> Result<Vec<OrderItem>, RepositoryError>;

    /// Lines for many orders in one query.
    async fn lines_for_orders(
        &mut self,
        order_ids: &[i32],
    ) -> Result<Vec<OrderItem>, RepositoryError>;

    /// Inserts a PAID order.
    async fn insert_order(
        &mut self,
        user_id: i32,
        ordered_at: NaiveDateTime,
    ) -> Result<Order, RepositoryError>;

    async fn insert_order_lines(
        &mut self,
        order_id: i32,
        lines: &[OrderLineRecord],
    ) -> Result<(), RepositoryError>;

    async fn update_status(
        &mut self,
        order_id: i32,
        status: OrderStatus,
        completed_at: Option<NaiveDateTime>,
    ) -> Result<Order, RepositoryError>;

    /// PAID orders of an account dated at or after `cutoff`, locked.
    async fn paid_orders_from(
        &mut self,
        user_id: i32,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Order>, RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}
