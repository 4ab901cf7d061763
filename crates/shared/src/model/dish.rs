use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog row. The menu is managed elsewhere; the ledger only resolves
/// ids to prices.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dish {
    pub dish_id: i32,
    pub name: String,
    pub price: i64,
}
