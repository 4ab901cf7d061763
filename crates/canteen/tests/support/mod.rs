//! In-memory doubles for the ledger collaborators, shared by the
//! integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use canteen::abstract_trait::{
    DishQueryRepositoryTrait, DynDishQueryRepository, DynLedgerStore, DynNotifier,
    DynOrderQueryRepository, DynUserQueryRepository, LedgerStoreTrait, LedgerTxTrait,
    NotifierTrait, OrderQueryRepositoryTrait, UserQueryRepositoryTrait,
};
use canteen::domain::requests::{FindAllOrders, OrderLineRecord};
use canteen::service::{
    AccountService, AccountServiceDeps, OrderCommandService, OrderCommandServiceDeps,
    OrderQueryService, OrderQueryServiceDeps, SubscriptionService, SubscriptionServiceDeps,
};
use chrono::{NaiveDateTime, Utc};
use prometheus_client::registry::Registry;
use shared::errors::{RepositoryError, ServiceError};
use shared::model::{
    AuthContext, Dish, Order, OrderItem, OrderItemDetail, OrderStatus, User, UserRole,
};
use shared::utils::Metrics;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

#[derive(Default, Clone)]
struct BackendState {
    users: HashMap<i32, User>,
    dishes: HashMap<i32, Dish>,
    orders: HashMap<i32, Order>,
    lines: HashMap<i32, Vec<OrderItem>>,
    next_order_id: i32,
}

/// In-memory stand-in for the Postgres store with the same locking
/// discipline: `begin` holds the state lock for the whole transaction,
/// mutations land on a working copy, and only `commit` publishes it.
/// Dropping a transaction without committing discards the copy.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_user(&self, user: User) {
        self.state.lock().await.users.insert(user.user_id, user);
    }

    pub async fn seed_dish(&self, dish: Dish) {
        self.state.lock().await.dishes.insert(dish.dish_id, dish);
    }

    pub async fn set_price(&self, dish_id: i32, price: i64) {
        if let Some(dish) = self.state.lock().await.dishes.get_mut(&dish_id) {
            dish.price = price;
        }
    }

    pub async fn seed_order(&self, order: Order, lines: Vec<OrderItem>) {
        let mut state = self.state.lock().await;
        state.next_order_id = state.next_order_id.max(order.order_id);
        state.lines.insert(order.order_id, lines);
        state.orders.insert(order.order_id, order);
    }

    pub async fn balance_of(&self, user_id: i32) -> i64 {
        self.state.lock().await.users[&user_id].balance
    }

    pub async fn stored_user(&self, user_id: i32) -> User {
        self.state.lock().await.users[&user_id].clone()
    }

    pub async fn stored_order(&self, order_id: i32) -> Order {
        self.state.lock().await.orders[&order_id].clone()
    }

    pub async fn orders_of(&self, user_id: i32) -> Vec<Order> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.ordered_at, o.order_id));
        orders
    }

    pub async fn lines_of(&self, order_id: i32) -> Vec<OrderItem> {
        self.state
            .lock()
            .await
            .lines
            .get(&order_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<BackendState>,
    working: BackendState,
}

#[async_trait]
impl LedgerStoreTrait for InMemoryBackend {
    async fn begin(&self) -> Result<Box<dyn LedgerTxTrait>, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryTx { guard, working }))
    }
}

#[async_trait]
impl LedgerTxTrait for InMemoryTx {
    async fn account_for_update(&mut self, user_id: i32) -> Result<User, RepositoryError> {
        self.working
            .users
            .get(&user_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn debit_balance(&mut self, user_id: i32, amount: i64) -> Result<i64, RepositoryError> {
        match self.working.users.get_mut(&user_id) {
            Some(user) if user.balance >= amount => {
                user.balance -= amount;
                Ok(user.balance)
            }
            _ => Err(RepositoryError::InsufficientFunds),
        }
    }

    async fn credit_balance(&mut self, user_id: i32, amount: i64) -> Result<i64, RepositoryError> {
        let user = self
            .working
            .users
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        user.balance += amount;
        Ok(user.balance)
    }

    async fn set_subscription(
        &mut self,
        user_id: i32,
        start: Option<NaiveDateTime>,
        days: i32,
    ) -> Result<(), RepositoryError> {
        let user = self
            .working
            .users
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        user.subscription_start = start;
        user.subscription_days = days;
        Ok(())
    }

    async fn order_for_update(&mut self, order_id: i32) -> Result<Order, RepositoryError> {
        self.working
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn order_lines(&mut self, order_id: i32) -> Result<Vec<OrderItem>, RepositoryError> {
        let mut lines = self
            .working
            .lines
            .get(&order_id)
            .cloned()
            .unwrap_or_default();
        lines.sort_by_key(|line| line.dish_id);
        Ok(lines)
    }

    async fn lines_for_orders(
        &mut self,
        order_ids: &[i32],
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let mut lines: Vec<OrderItem> = order_ids
            .iter()
            .flat_map(|id| self.working.lines.get(id).cloned().unwrap_or_default())
            .collect();
        lines.sort_by_key(|line| (line.order_id, line.dish_id));
        Ok(lines)
    }

    async fn insert_order(
        &mut self,
        user_id: i32,
        ordered_at: NaiveDateTime,
    ) -> Result<Order, RepositoryError> {
        self.working.next_order_id += 1;
        let order = Order {
            order_id: self.working.next_order_id,
            user_id,
            ordered_at,
            completed_at: None,
            status: OrderStatus::Paid,
        };
        self.working.orders.insert(order.order_id, order.clone());
        Ok(order)
    }

    async fn insert_order_lines(
        &mut self,
        order_id: i32,
        lines: &[OrderLineRecord],
    ) -> Result<(), RepositoryError> {
        let entry = self.working.lines.entry(order_id).or_default();
        for line in lines {
            entry.push(OrderItem {
                order_id,
                dish_id: line.dish_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }
        Ok(())
    }

    async fn update_status(
        &mut self,
        order_id: i32,
        status: OrderStatus,
        completed_at: Option<NaiveDateTime>,
    ) -> Result<Order, RepositoryError> {
        let order = self
            .working
            .orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound)?;
        order.status = status;
        if completed_at.is_some() {
            order.completed_at = completed_at;
        }
        Ok(order.clone())
    }

    async fn paid_orders_from(
        &mut self,
        user_id: i32,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .working
            .orders
            .values()
            .filter(|o| {
                o.user_id == user_id && o.status == OrderStatus::Paid && o.ordered_at >= cutoff
            })
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.ordered_at, o.order_id));
        Ok(orders)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let InMemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl UserQueryRepositoryTrait for InMemoryBackend {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl DishQueryRepositoryTrait for InMemoryBackend {
    async fn find_by_ids(&self, dish_ids: &[i32]) -> Result<Vec<Dish>, RepositoryError> {
        let state = self.state.lock().await;
        let mut dishes: Vec<Dish> = state
            .dishes
            .values()
            .filter(|d| dish_ids.contains(&d.dish_id))
            .cloned()
            .collect();
        dishes.sort_by_key(|d| d.dish_id);
        Ok(dishes)
    }

    async fn find_by_id(&self, dish_id: i32) -> Result<Option<Dish>, RepositoryError> {
        Ok(self.state.lock().await.dishes.get(&dish_id).cloned())
    }
}

#[async_trait]
impl OrderQueryRepositoryTrait for InMemoryBackend {
    async fn find_all(&self, req: &FindAllOrders) -> Result<(Vec<Order>, i64), RepositoryError> {
        let state = self.state.lock().await;
        let mut matching: Vec<Order> = state
            .orders
            .values()
            .filter(|o| req.user_id.map_or(true, |id| o.user_id == id))
            .filter(|o| req.status.map_or(true, |s| o.status == s))
            .filter(|o| req.date_from.map_or(true, |d| o.ordered_at.date() >= d))
            .filter(|o| req.date_to.map_or(true, |d| o.ordered_at.date() <= d))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.ordered_at.cmp(&a.ordered_at));

        let total = matching.len() as i64;
        let limit = req.page_size.max(1) as usize;
        let offset = ((req.page - 1).max(0) as usize) * limit;
        let page: Vec<Order> = matching.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn find_by_id(&self, order_id: i32) -> Result<Option<Order>, RepositoryError> {
        Ok(self.state.lock().await.orders.get(&order_id).cloned())
    }

    async fn find_lines(&self, order_id: i32) -> Result<Vec<OrderItemDetail>, RepositoryError> {
        let state = self.state.lock().await;
        let mut details: Vec<OrderItemDetail> = state
            .lines
            .get(&order_id)
            .map(|lines| {
                lines
                    .iter()
                    .map(|line| OrderItemDetail {
                        order_id: line.order_id,
                        dish_id: line.dish_id,
                        dish_name: state
                            .dishes
                            .get(&line.dish_id)
                            .map(|d| d.name.clone())
                            .unwrap_or_default(),
                        quantity: line.quantity,
                        unit_price: line.unit_price,
                    })
                    .collect()
            })
            .unwrap_or_default();
        details.sort_by_key(|d| d.dish_id);
        Ok(details)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub user_id: Option<i32>,
    pub role: Option<UserRole>,
    pub title: String,
    pub body: String,
}

/// Records notifications instead of delivering them. `set_fail` makes
/// every send error, for checking that a lost notification never rolls
/// back a committed ledger operation.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<SentNotification>>,
    fail: RwLock<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl NotifierTrait for RecordingNotifier {
    async fn notify_user(
        &self,
        user_id: i32,
        title: &str,
        body: &str,
    ) -> Result<(), ServiceError> {
        if *self.fail.read().await {
            return Err(ServiceError::Custom("Notification channel down".to_string()));
        }
        self.sent.write().await.push(SentNotification {
            user_id: Some(user_id),
            role: None,
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn notify_role(
        &self,
        role: UserRole,
        title: &str,
        body: &str,
    ) -> Result<(), ServiceError> {
        if *self.fail.read().await {
            return Err(ServiceError::Custom("Notification channel down".to_string()));
        }
        self.sent.write().await.push(SentNotification {
            user_id: None,
            role: Some(role),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub async fn order_command_service(
    backend: &Arc<InMemoryBackend>,
    notifier: &Arc<RecordingNotifier>,
) -> OrderCommandService {
    let ledger: DynLedgerStore = backend.clone();
    let dish_query: DynDishQueryRepository = backend.clone();
    let notifier: DynNotifier = notifier.clone();
    OrderCommandService::new(OrderCommandServiceDeps {
        ledger,
        dish_query,
        notifier,
        metrics: Arc::new(Mutex::new(Metrics::new())),
        registry: Arc::new(Mutex::new(Registry::default())),
    })
    .await
}

pub async fn order_query_service(backend: &Arc<InMemoryBackend>) -> OrderQueryService {
    let query: DynOrderQueryRepository = backend.clone();
    OrderQueryService::new(OrderQueryServiceDeps {
        query,
        metrics: Arc::new(Mutex::new(Metrics::new())),
        registry: Arc::new(Mutex::new(Registry::default())),
    })
    .await
}

pub async fn subscription_service(
    backend: &Arc<InMemoryBackend>,
    notifier: &Arc<RecordingNotifier>,
) -> SubscriptionService {
    let ledger: DynLedgerStore = backend.clone();
    let user_query: DynUserQueryRepository = backend.clone();
    let notifier: DynNotifier = notifier.clone();
    SubscriptionService::new(SubscriptionServiceDeps {
        ledger,
        user_query,
        notifier,
        metrics: Arc::new(Mutex::new(Metrics::new())),
        registry: Arc::new(Mutex::new(Registry::default())),
    })
    .await
}

pub async fn account_service(backend: &Arc<InMemoryBackend>) -> AccountService {
    let user_query: DynUserQueryRepository = backend.clone();
    let ledger: DynLedgerStore = backend.clone();
    AccountService::new(AccountServiceDeps {
        user_query,
        ledger,
        metrics: Arc::new(Mutex::new(Metrics::new())),
        registry: Arc::new(Mutex::new(Registry::default())),
    })
    .await
}

pub fn student(user_id: i32, balance: i64) -> User {
    User {
        user_id,
        name: "Ivan".to_string(),
        surname: "Petrov".to_string(),
        patronymic: None,
        role: UserRole::Student,
        banned: false,
        balance,
        subscription_start: None,
        subscription_days: 0,
        registered_at: Utc::now().naive_utc(),
    }
}

pub fn cook(user_id: i32) -> User {
    User {
        role: UserRole::Cook,
        ..student(user_id, 0)
    }
}

pub fn dish(dish_id: i32, name: &str, price: i64) -> Dish {
    Dish {
        dish_id,
        name: name.to_string(),
        price,
    }
}

pub fn paid_order(order_id: i32, user_id: i32, ordered_at: NaiveDateTime) -> Order {
    Order {
        order_id,
        user_id,
        ordered_at,
        completed_at: None,
        status: OrderStatus::Paid,
    }
}

pub fn item(order_id: i32, dish_id: i32, quantity: i32, unit_price: i64) -> OrderItem {
    OrderItem {
        order_id,
        dish_id,
        quantity,
        unit_price,
    }
}

pub fn as_student(account_id: i32) -> AuthContext {
    AuthContext {
        account_id,
        role: UserRole::Student,
    }
}

pub fn as_cook(account_id: i32) -> AuthContext {
    AuthContext {
        account_id,
        role: UserRole::Cook,
    }
}
