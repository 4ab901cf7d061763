use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::model::OrderStatus;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
pub struct FindAllOrders {
    #[serde(default = "default_page")]
    pub page: i32,

    #[serde(default = "default_page_size")]
    pub page_size: i32,

    pub user_id: Option<i32>,

    pub status: Option<OrderStatus>,

    pub date_from: Option<NaiveDate>,

    pub date_to: Option<NaiveDate>,
}

fn default_page() -> i32 {
    1
}

fn default_page_size() -> i32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderDishRequest {
    #[validate(range(min = 1, message = "Dish ID is required"))]
    #[schema(example = 1)]
    pub dish_id: i32,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    #[schema(example = 2)]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Order must contain at least one dish"), nested)]
    pub dishes: Vec<OrderDishRequest>,

    /// Staff may place an order on behalf of another account. Students
    /// are pinned to their own.
    #[schema(example = json!(null))]
    pub user_id: Option<i32>,
}

/// Line ready for insertion: quantity plus the price snapshotted from
/// the catalog at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRecord {
    pub dish_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
}
