use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Lifecycle of a meal order. Orders are born PAID (money moves at
/// creation), the kitchen marks them prepared, and they end either
/// served or cancelled. The wire value for `Ready` is `"prepared"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Paid,
    #[sqlx(rename = "prepared")]
    #[serde(rename = "prepared")]
    Ready,
    Served,
    Cancelled,
}

impl OrderStatus {
    pub fn can_become(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Paid, OrderStatus::Ready)
                | (OrderStatus::Paid, OrderStatus::Served)
                | (OrderStatus::Ready, OrderStatus::Served)
                | (OrderStatus::Paid, OrderStatus::Cancelled)
                | (OrderStatus::Ready, OrderStatus::Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Served | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Paid => "paid",
            OrderStatus::Ready => "prepared",
            OrderStatus::Served => "served",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub order_id: i32,
    pub user_id: i32,
    pub ordered_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub status: OrderStatus,
}

/// One line of an order. `unit_price` is the catalog price snapshotted
/// when the order was created; refunds are computed from it, never from
/// the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub order_id: i32,
    pub dish_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        self.unit_price * self.quantity as i64
    }
}

/// Line joined with the dish name, for read endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItemDetail {
    pub order_id: i32,
    pub dish_id: i32,
    pub dish_name: String,
    pub quantity: i32,
    pub unit_price: i64,
}
