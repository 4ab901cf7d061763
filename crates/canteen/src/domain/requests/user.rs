use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TopUpRequest {
    /// Amount in kopecks.
    #[validate(range(min = 1, message = "Amount must be positive"))]
    #[schema(example = 50000)]
    pub amount: i64,
}
