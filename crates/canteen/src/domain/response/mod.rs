mod order;
mod subscription;
mod user;

pub use self::order::{OrderDetailResponse, OrderLineResponse, OrderResponse};
pub use self::subscription::{
    CancelSubscriptionResponse, PurchaseSubscriptionResponse, SubscriptionResponse,
};
pub use self::user::{BalanceResponse, UserResponse};
