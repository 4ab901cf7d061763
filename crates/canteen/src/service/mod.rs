mod notification;
mod order;
mod subscription;
mod user;

pub use self::notification::NotificationService;
pub use self::order::{
    OrderCommandService, OrderCommandServiceDeps, OrderQueryService, OrderQueryServiceDeps,
};
pub use self::subscription::{SubscriptionService, SubscriptionServiceDeps};
pub use self::user::{AccountService, AccountServiceDeps};
