use serde::{Deserialize, Serialize};
use shared::model::{User, UserRole};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub role: UserRole,
    pub banned: bool,
    /// Balance in kopecks.
    pub balance: i64,
    #[serde(rename = "registered_at")]
    pub registered_at: String,
}

// model to response
impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        UserResponse {
            id: value.user_id,
            name: value.name,
            surname: value.surname,
            patronymic: value.patronymic,
            role: value.role,
            banned: value.banned,
            balance: value.balance,
            registered_at: value.registered_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct BalanceResponse {
    pub user_id: i32,
    /// Balance in kopecks after the operation.
    pub balance: i64,
}
