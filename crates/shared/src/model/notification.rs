use crate::model::UserRole;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Persisted notification. Either `user_id` (personal) or `role`
/// (broadcast) is set. Delivery transport is out of scope; rows are the
/// record of what would be pushed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub notification_id: i32,
    pub user_id: Option<i32>,
    pub role: Option<UserRole>,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: NaiveDateTime,
}
