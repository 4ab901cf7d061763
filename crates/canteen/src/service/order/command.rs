use crate::{
    abstract_trait::{
        DynDishQueryRepository, DynLedgerStore, DynNotifier, OrderCommandServiceTrait,
    },
    domain::{
        requests::{CreateOrderRequest, OrderLineRecord},
        response::{OrderDetailResponse, OrderLineResponse, OrderResponse},
    },
};
use async_trait::async_trait;
use chrono::Utc;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::ApiResponse,
    errors::{RepositoryError, ServiceError},
    model::{AuthContext, Dish, OrderStatus, UserRole},
    utils::{Method, Metrics, Status as StatusUtils},
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::{sync::Mutex, time::Instant};
use tracing::{error, info};

pub struct OrderCommandService {
    pub ledger: DynLedgerStore,
    pub dish_query: DynDishQueryRepository,
    pub notifier: DynNotifier,
    pub metrics: Arc<Mutex<Metrics>>,
}

pub struct OrderCommandServiceDeps {
    pub ledger: DynLedgerStore,
    pub dish_query: DynDishQueryRepository,
    pub notifier: DynNotifier,
    pub metrics: Arc<Mutex<Metrics>>,
    pub registry: Arc<Mutex<Registry>>,
}

impl OrderCommandService {
    pub async fn new(deps: OrderCommandServiceDeps) -> Self {
        let OrderCommandServiceDeps {
            ledger,
            dish_query,
            notifier,
            metrics,
            registry,
        } = deps;

        registry.lock().await.register(
            "order_command_request_counter",
            "Total number of requests to the OrderCommandService",
            metrics.lock().await.request_counter.clone(),
        );
        registry.lock().await.register(
            "order_command_request_duration",
            "Histogram of request durations for the OrderCommandService",
            metrics.lock().await.request_duration.clone(),
        );

        Self {
            ledger,
            dish_query,
            notifier,
            metrics,
        }
    }

    async fn record_success(&self, method: Method, started: Instant, message: &str) {
        info!("✅ Operation completed successfully: {message}");

        self.metrics.lock().await.record(
            method,
            StatusUtils::Success,
            started.elapsed().as_secs_f64(),
        );
    }

    async fn record_error(&self, method: Method, started: Instant, message: &str) {
        error!("❌ Operation failed: {message}");

        self.metrics
            .lock()
            .await
            .record(method, StatusUtils::Error, started.elapsed().as_secs_f64());
    }
}

#[async_trait]
impl OrderCommandServiceTrait for OrderCommandService {
    async fn create_order(
        &self,
        acting: AuthContext,
        req: &CreateOrderRequest,
    ) -> Result<ApiResponse<OrderDetailResponse>, ServiceError> {
        info!(
            "🏗️ Creating new order with {} dishes for account {}",
            req.dishes.len(),
            acting.account_id
        );

        let method = Method::Post;
        let started = Instant::now();

        let mut seen = HashSet::new();
        for dish in &req.dishes {
            if !seen.insert(dish.dish_id) {
                self.record_error(method, started, "Duplicate dish in order")
                    .await;
                return Err(ServiceError::Validation(vec![format!(
                    "Dish {} appears more than once",
                    dish.dish_id
                )]));
            }
        }

        let target_user = match req.user_id {
            Some(user_id) if user_id != acting.account_id => {
                if !acting.is_staff() {
                    self.record_error(method, started, "Order for another account denied")
                        .await;
                    return Err(ServiceError::Forbidden(
                        "Students can only place orders for themselves".to_string(),
                    ));
                }
                user_id
            }
            Some(user_id) => user_id,
            None => acting.account_id,
        };

        let dish_ids: Vec<i32> = req.dishes.iter().map(|d| d.dish_id).collect();

        let dishes = match self.dish_query.find_by_ids(&dish_ids).await {
            Ok(dishes) => dishes,
            Err(e) => {
                error!("❌ Failed to fetch dishes: {e:?}");

                self.record_error(method, started, "Failed to fetch dishes")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if dishes.len() != dish_ids.len() {
            let found: HashSet<i32> = dishes.iter().map(|d| d.dish_id).collect();
            let missing: Vec<i32> = dish_ids
                .iter()
                .copied()
                .filter(|id| !found.contains(id))
                .collect();

            error!("❌ Unknown dishes in order: {missing:?}");

            self.record_error(method, started, "Unknown dishes in order")
                .await;
            return Err(ServiceError::BadRequest(format!(
                "Dishes not found: {missing:?}"
            )));
        }

        let dish_by_id: HashMap<i32, Dish> =
            dishes.into_iter().map(|d| (d.dish_id, d)).collect();

        let mut lines = Vec::with_capacity(req.dishes.len());
        let mut total: i64 = 0;

        for dish_req in &req.dishes {
            if let Some(dish) = dish_by_id.get(&dish_req.dish_id) {
                total += dish.price * dish_req.quantity as i64;
                lines.push(OrderLineRecord {
                    dish_id: dish.dish_id,
                    quantity: dish_req.quantity,
                    unit_price: dish.price,
                });
            }
        }

        let mut tx = match self.ledger.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                self.record_error(method, started, "Failed to open transaction")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        let account = match tx.account_for_update(target_user).await {
            Ok(account) => account,
            Err(RepositoryError::NotFound) => {
                error!("❌ User not found with ID={target_user}");

                self.record_error(method, started, "User not found").await;
                return Err(ServiceError::NotFound("User".to_string()));
            }
            Err(e) => {
                error!("❌ Failed to fetch account: {e:?}");

                self.record_error(method, started, "Failed to fetch account")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if account.banned {
            error!("❌ Banned account {target_user} tried to place an order");

            self.record_error(method, started, "Banned account").await;
            return Err(ServiceError::Forbidden(
                "Banned users cannot place orders".to_string(),
            ));
        }

        if account.balance < total {
            error!(
                "❌ Not enough balance for user_id={target_user}, needed={total}, available={}",
                account.balance
            );

            self.record_error(method, started, "Insufficient balance")
                .await;
            return Err(ServiceError::InsufficientFunds {
                needed: total,
                available: account.balance,
            });
        }

        let new_balance = match tx.debit_balance(target_user, total).await {
            Ok(balance) => balance,
            Err(RepositoryError::InsufficientFunds) => {
                self.record_error(method, started, "Insufficient balance")
                    .await;
                return Err(ServiceError::InsufficientFunds {
                    needed: total,
                    available: account.balance,
                });
            }
            Err(e) => {
                error!("❌ Failed to debit balance: {e:?}");

                self.record_error(method, started, "Failed to debit balance")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        info!("✅ Debited {total} kopecks from user {target_user}, balance now {new_balance}");

        let now = Utc::now().naive_utc();

        let order = match tx.insert_order(target_user, now).await {
            Ok(order) => order,
            Err(e) => {
                error!("❌ Failed to insert order: {e:?}");

                self.record_error(method, started, "Failed to insert order")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if let Err(e) = tx.insert_order_lines(order.order_id, &lines).await {
            error!("❌ Failed to insert order lines: {e:?}");

            self.record_error(method, started, "Failed to insert order lines")
                .await;
            return Err(ServiceError::Repo(e));
        }

        if let Err(e) = tx.commit().await {
            self.record_error(method, started, "Failed to commit order")
                .await;
            return Err(ServiceError::Repo(e));
        }

        info!(
            "✅ Order created with ID={} for user {target_user}, total {total} kopecks",
            order.order_id
        );

        if let Err(e) = self
            .notifier
            .notify_role(
                UserRole::Cook,
                "New paid order",
                &format!("Order #{} is paid and waiting", order.order_id),
            )
            .await
        {
            error!(
                "❌ Failed to notify cooks about order {}: {e:?}",
                order.order_id
            );
        }

        let line_responses: Vec<OrderLineResponse> = lines
            .iter()
            .filter_map(|line| {
                dish_by_id.get(&line.dish_id).map(|dish| OrderLineResponse {
                    dish_id: line.dish_id,
                    name: dish.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
            })
            .collect();

        let response = OrderDetailResponse::new(order, line_responses);

        self.record_success(method, started, "Order created").await;

        Ok(ApiResponse {
            status: "success".to_string(),
            message: "Order created successfully".to_string(),
            data: response,
        })
    }

    async fn mark_ready(
        &self,
        acting: AuthContext,
        order_id: i32,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError> {
        info!("🍲 Marking order {order_id} ready");

        let method = Method::Post;
        let started = Instant::now();

        if !acting.is_staff() {
            self.record_error(method, started, "Mark ready denied").await;
            return Err(ServiceError::Forbidden(
                "Only staff can mark orders ready".to_string(),
            ));
        }

        let mut tx = match self.ledger.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                self.record_error(method, started, "Failed to open transaction")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        let order = match tx.order_for_update(order_id).await {
            Ok(order) => order,
            Err(RepositoryError::NotFound) => {
                error!("❌ Order not found with ID={order_id}");

                self.record_error(method, started, "Order not found").await;
                return Err(ServiceError::NotFound("Order".to_string()));
            }
            Err(e) => {
                error!("❌ Failed to fetch order: {e:?}");

                self.record_error(method, started, "Failed to fetch order")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if !order.status.can_become(OrderStatus::Ready) {
            error!(
                "❌ Order {order_id} cannot go to prepared from {:?}",
                order.status
            );

            self.record_error(method, started, "Invalid status transition")
                .await;
            return Err(ServiceError::Conflict(
                "Only paid orders can be marked ready".to_string(),
            ));
        }

        let updated = match tx.update_status(order_id, OrderStatus::Ready, None).await {
            Ok(order) => order,
            Err(e) => {
                error!("❌ Failed to update order status: {e:?}");

                self.record_error(method, started, "Failed to update status")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if let Err(e) = tx.commit().await {
            self.record_error(method, started, "Failed to commit status change")
                .await;
            return Err(ServiceError::Repo(e));
        }

        if let Err(e) = self
            .notifier
            .notify_user(
                updated.user_id,
                "Order ready",
                &format!("Order #{order_id} is ready for pickup"),
            )
            .await
        {
            error!("❌ Failed to notify user about order {order_id}: {e:?}");
        }

        self.record_success(method, started, "Order marked ready")
            .await;

        Ok(ApiResponse {
            status: "success".to_string(),
            message: "Order marked ready".to_string(),
            data: OrderResponse::from(updated),
        })
    }

    async fn mark_served(
        &self,
        acting: AuthContext,
        order_id: i32,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError> {
        info!("🍽️ Serving order {order_id}");

        let method = Method::Post;
        let started = Instant::now();

        let mut tx = match self.ledger.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                self.record_error(method, started, "Failed to open transaction")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        let order = match tx.order_for_update(order_id).await {
            Ok(order) => order,
            Err(RepositoryError::NotFound) => {
                error!("❌ Order not found with ID={order_id}");

                self.record_error(method, started, "Order not found").await;
                return Err(ServiceError::NotFound("Order".to_string()));
            }
            Err(e) => {
                error!("❌ Failed to fetch order: {e:?}");

                self.record_error(method, started, "Failed to fetch order")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if !acting.is_staff() && order.user_id != acting.account_id {
            self.record_error(method, started, "Serve denied").await;
            return Err(ServiceError::Forbidden(
                "You can only confirm your own orders".to_string(),
            ));
        }

        if !order.status.can_become(OrderStatus::Served) {
            let message = match order.status {
                OrderStatus::Served => "Order already served",
                OrderStatus::Cancelled => "Cannot serve a cancelled order",
                _ => "Order cannot be served",
            };

            error!("❌ Order {order_id} in status {:?}: {message}", order.status);

            self.record_error(method, started, "Invalid status transition")
                .await;
            return Err(ServiceError::Conflict(message.to_string()));
        }

        let now = Utc::now().naive_utc();

        let updated = match tx
            .update_status(order_id, OrderStatus::Served, Some(now))
            .await
        {
            Ok(order) => order,
            Err(e) => {
                error!("❌ Failed to update order status: {e:?}");

                self.record_error(method, started, "Failed to update status")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if let Err(e) = tx.commit().await {
            self.record_error(method, started, "Failed to commit status change")
                .await;
            return Err(ServiceError::Repo(e));
        }

        self.record_success(method, started, "Order served").await;

        Ok(ApiResponse {
            status: "success".to_string(),
            message: "Order served".to_string(),
            data: OrderResponse::from(updated),
        })
    }

    async fn cancel_order(
        &self,
        acting: AuthContext,
        order_id: i32,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError> {
        info!("🗑️ Cancelling order {order_id}");

        let method = Method::Post;
        let started = Instant::now();

        let mut tx = match self.ledger.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                self.record_error(method, started, "Failed to open transaction")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        // Lock order first, account second. The subscription paths take
        // their locks in the same order.
        let order = match tx.order_for_update(order_id).await {
            Ok(order) => order,
            Err(RepositoryError::NotFound) => {
                error!("❌ Order not found with ID={order_id}");

                self.record_error(method, started, "Order not found").await;
                return Err(ServiceError::NotFound("Order".to_string()));
            }
            Err(e) => {
                error!("❌ Failed to fetch order: {e:?}");

                self.record_error(method, started, "Failed to fetch order")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if !acting.is_staff() && order.user_id != acting.account_id {
            self.record_error(method, started, "Cancel denied").await;
            return Err(ServiceError::Forbidden(
                "You can only cancel your own orders".to_string(),
            ));
        }

        if !order.status.can_become(OrderStatus::Cancelled) {
            let message = match order.status {
                OrderStatus::Served => "Cannot cancel a served order",
                OrderStatus::Cancelled => "Order already cancelled",
                _ => "Order cannot be cancelled",
            };

            error!("❌ Order {order_id} in status {:?}: {message}", order.status);

            self.record_error(method, started, "Invalid status transition")
                .await;
            return Err(ServiceError::Conflict(message.to_string()));
        }

        let lines = match tx.order_lines(order_id).await {
            Ok(lines) => lines,
            Err(e) => {
                error!("❌ Failed to fetch order lines: {e:?}");

                self.record_error(method, started, "Failed to fetch order lines")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        // Refund from the snapshot prices, not the current catalog.
        let refund: i64 = lines.iter().map(|line| line.line_total()).sum();

        let now = Utc::now().naive_utc();

        let updated = match tx
            .update_status(order_id, OrderStatus::Cancelled, Some(now))
            .await
        {
            Ok(order) => order,
            Err(e) => {
                error!("❌ Failed to update order status: {e:?}");

                self.record_error(method, started, "Failed to update status")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if refund > 0 {
            match tx.credit_balance(order.user_id, refund).await {
                Ok(balance) => {
                    info!(
                        "✅ Refunded {refund} kopecks to user {}, balance now {balance}",
                        order.user_id
                    );
                }
                Err(e) => {
                    error!("❌ Failed to refund balance: {e:?}");

                    self.record_error(method, started, "Failed to refund balance")
                        .await;
                    return Err(ServiceError::Repo(e));
                }
            }
        }

        if let Err(e) = tx.commit().await {
            self.record_error(method, started, "Failed to commit cancellation")
                .await;
            return Err(ServiceError::Repo(e));
        }

        if let Err(e) = self
            .notifier
            .notify_user(
                order.user_id,
                "Order cancelled",
                &format!("Order #{order_id} was cancelled, {refund} kopecks refunded"),
            )
            .await
        {
            error!("❌ Failed to notify user about order {order_id}: {e:?}");
        }

        self.record_success(method, started, "Order cancelled").await;

        Ok(ApiResponse {
            status: "success".to_string(),
            message: "Order cancelled successfully".to_string(),
            data: OrderResponse::from(updated),
        })
    }
}
