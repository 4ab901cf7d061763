mod dish;
mod ledger;
mod notification;
mod order;
mod subscription;
mod user;

pub use self::dish::{DishQueryRepositoryTrait, DynDishQueryRepository};
pub use self::ledger::{DynLedgerStore, LedgerStoreTrait, LedgerTxTrait};
pub use self::notification::{
    DynNotificationCommandRepository, DynNotifier, NotificationCommandRepositoryTrait, NotifierTrait,
};
pub use self::order::{
    DynOrderCommandService, DynOrderQueryRepository, DynOrderQueryService,
    OrderCommandServiceTrait, OrderQueryRepositoryTrait, OrderQueryServiceTrait,
};
pub use self::subscription::{DynSubscriptionService, SubscriptionServiceTrait};
pub use self::user::{
    AccountServiceTrait, DynAccountService, DynUserQueryRepository, UserQueryRepositoryTrait,
};
