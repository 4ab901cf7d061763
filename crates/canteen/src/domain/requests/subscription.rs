use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// `id_order` names the template order whose dishes are repeated for
/// every scheduled weekday.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PurchaseSubscriptionRequest {
    #[validate(range(min = 1, message = "Order ID is required"))]
    #[schema(example = 17)]
    pub id_order: i32,

    #[validate(range(min = 1, message = "Days must be at least 1"))]
    #[schema(example = 5)]
    pub days: i32,
}
