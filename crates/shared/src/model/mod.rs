mod dish;
mod notification;
mod order;
mod user;

pub use self::dish::Dish;
pub use self::notification::Notification;
pub use self::order::{Order, OrderItem, OrderItemDetail, OrderStatus};
pub use self::user::{AuthContext, User, UserRole};
