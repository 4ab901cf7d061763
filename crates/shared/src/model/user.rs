use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Student,
    Cook,
}

/// Account row. `balance` is stored in kopecks and the schema enforces
/// it never goes negative. A subscription is active while
/// `now < subscription_start + subscription_days`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i32,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub role: UserRole,
    pub banned: bool,
    pub balance: i64,
    pub subscription_start: Option<NaiveDateTime>,
    pub subscription_days: i32,
    pub registered_at: NaiveDateTime,
}

impl User {
    pub fn has_active_subscription(&self, now: NaiveDateTime) -> bool {
        match self.subscription_start {
            Some(start) => now < start + chrono::Duration::days(self.subscription_days as i64),
            None => false,
        }
    }
}

/// Resolved caller identity, inserted by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub account_id: i32,
    pub role: UserRole,
}

impl AuthContext {
    pub fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Cook)
    }
}
