mod dish;
mod ledger;
mod notification;
mod order;
mod user;

pub use self::dish::DishQueryRepository;
pub use self::ledger::PgLedgerStore;
pub use self::notification::NotificationCommandRepository;
pub use self::order::OrderQueryRepository;
pub use self::user::UserQueryRepository;
