use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SubscriptionResponse {
    pub user_id: i32,
    #[serde(rename = "subscription_start")]
    pub subscription_start: Option<String>,
    pub subscription_days: i32,
    pub days_remaining: i64,
    pub is_active: bool,
}

impl SubscriptionResponse {
    /// `subscription_days` is a calendar span, so the window keeps
    /// covering weekends between scheduled weekdays.
    pub fn compute(
        user_id: i32,
        start: Option<NaiveDateTime>,
        days: i32,
        now: NaiveDateTime,
    ) -> Self {
        let (days_remaining, is_active) = match start {
            Some(start) => {
                let end = start + Duration::days(days as i64);
                ((end - now).num_days().max(0), now < end)
            }
            None => (0, false),
        };

        SubscriptionResponse {
            user_id,
            subscription_start: start.map(|dt| dt.to_string()),
            subscription_days: days,
            days_remaining,
            is_active,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct PurchaseSubscriptionResponse {
    pub subscription: SubscriptionResponse,
    /// Number of weekday orders generated.
    pub created_orders: i32,
    /// Total debited, in kopecks.
    pub total_cost: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CancelSubscriptionResponse {
    /// Aggregate refund in kopecks.
    pub refunded: i64,
    pub cancelled_orders: i32,
}
