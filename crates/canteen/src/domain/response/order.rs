use serde::{Deserialize, Serialize};
use shared::model::{Order, OrderItemDetail, OrderStatus};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct OrderResponse {
    pub id: i32,
    pub user_id: i32,
    pub status: OrderStatus,
    #[serde(rename = "ordered_at")]
    pub ordered_at: String,
    #[serde(rename = "completed_at")]
    pub completed_at: Option<String>,
}

// model to response
impl From<Order> for OrderResponse {
    fn from(value: Order) -> Self {
        OrderResponse {
            id: value.order_id,
            user_id: value.user_id,
            status: value.status,
            ordered_at: value.ordered_at.to_string(),
            completed_at: value.completed_at.map(|dt| dt.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct OrderLineResponse {
    pub dish_id: i32,
    pub name: String,
    pub quantity: i32,
    /// Price per unit in kopecks, snapshotted at order time.
    pub unit_price: i64,
}

impl From<OrderItemDetail> for OrderLineResponse {
    fn from(value: OrderItemDetail) -> Self {
        OrderLineResponse {
            dish_id: value.dish_id,
            name: value.dish_name,
            quantity: value.quantity,
            unit_price: value.unit_price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct OrderDetailResponse {
    pub id: i32,
    pub user_id: i32,
    pub status: OrderStatus,
    #[serde(rename = "ordered_at")]
    pub ordered_at: String,
    #[serde(rename = "completed_at")]
    pub completed_at: Option<String>,
    pub dishes: Vec<OrderLineResponse>,
    pub total: i64,
}

impl OrderDetailResponse {
    pub fn new(order: Order, dishes: Vec<OrderLineResponse>) -> Self {
        let total = dishes
            .iter()
            .map(|line| line.unit_price * line.quantity as i64)
            .sum();

        OrderDetailResponse {
            id: order.order_id,
            user_id: order.user_id,
            status: order.status,
            ordered_at: order.ordered_at.to_string(),
            completed_at: order.completed_at.map(|dt| dt.to_string()),
            dishes,
            total,
        }
    }
}
