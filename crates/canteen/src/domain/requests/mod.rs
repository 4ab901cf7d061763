mod order;
mod subscription;
mod user;

pub use self::order::{CreateOrderRequest, FindAllOrders, OrderDishRequest, OrderLineRecord};
pub use self::subscription::PurchaseSubscriptionRequest;
pub use self::user::TopUpRequest;
