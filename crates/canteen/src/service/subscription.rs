use crate::{
    abstract_trait::{
        DynLedgerStore, DynNotifier, DynUserQueryRepository, SubscriptionServiceTrait,
    },
    domain::{
        requests::{OrderLineRecord, PurchaseSubscriptionRequest},
        response::{
            CancelSubscriptionResponse, PurchaseSubscriptionResponse, SubscriptionResponse,
        },
    },
};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::ApiResponse,
    errors::{RepositoryError, ServiceError},
    model::{AuthContext, OrderStatus, UserRole},
    utils::{Method, Metrics, Status as StatusUtils},
};
use std::sync::Arc;
use tokio::{sync::Mutex, time::Instant};
use tracing::{error, info};

/// Weekday dates for the generated orders: the first `count` dates
/// strictly after `from` that fall on Monday through Friday.
fn schedule_dates(from: NaiveDate, count: i32) -> Vec<NaiveDate> {
    if count <= 0 {
        return Vec::new();
    }

    let mut dates = Vec::with_capacity(count as usize);
    let mut current = from;

    while dates.len() < count as usize {
        current = current + Duration::days(1);
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
    }

    dates
}

pub struct SubscriptionService {
    pub ledger: DynLedgerStore,
    pub user_query: DynUserQueryRepository,
    pub notifier: DynNotifier,
    pub metrics: Arc<Mutex<Metrics>>,
}

pub struct SubscriptionServiceDeps {
    pub ledger: DynLedgerStore,
    pub user_query: DynUserQueryRepository,
    pub notifier: DynNotifier,
    pub metrics: Arc<Mutex<Metrics>>,
    pub registry: Arc<Mutex<Registry>>,
}

impl SubscriptionService {
    pub async fn new(deps: SubscriptionServiceDeps) -> Self {
        let SubscriptionServiceDeps {
            ledger,
            user_query,
            notifier,
            metrics,
            registry,
        } = deps;

        registry.lock().await.register(
            "subscription_request_counter",
            "Total number of requests to the SubscriptionService",
            metrics.lock().await.request_counter.clone(),
        );
        registry.lock().await.register(
            "subscription_request_duration",
            "Histogram of request durations for the SubscriptionService",
            metrics.lock().await.request_duration.clone(),
        );

        Self {
            ledger,
            user_query,
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
impl SubscriptionServiceTrait for SubscriptionService {
    async fn purchase(
        &self,
        acting: AuthContext,
        req: &PurchaseSubscriptionRequest,
    ) -> Result<ApiResponse<PurchaseSubscriptionResponse>, ServiceError> {
        info!(
            "📅 Purchasing subscription from order {} for {} days, account {}",
            req.id_order, req.days, acting.account_id
        );

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

        // Template order first, account second. Same lock order as the
        // cancellation paths.
        let template = match tx.order_for_update(req.id_order).await {
            Ok(order) => order,
            Err(RepositoryError::NotFound) => {
                error!("❌ Template order not found with ID={}", req.id_order);

                self.record_error(method, started, "Order not found").await;
                return Err(ServiceError::NotFound("Order".to_string()));
            }
            Err(e) => {
                error!("❌ Failed to fetch template order: {e:?}");

                self.record_error(method, started, "Failed to fetch order")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if template.user_id != acting.account_id {
            self.record_error(method, started, "Foreign template order")
                .await;
            return Err(ServiceError::Forbidden(
                "You can only subscribe from your own order".to_string(),
            ));
        }

        if template.status == OrderStatus::Cancelled {
            self.record_error(method, started, "Cancelled template order")
                .await;
            return Err(ServiceError::BadRequest(
                "Cannot subscribe from a cancelled order".to_string(),
            ));
        }

        let account = match tx.account_for_update(acting.account_id).await {
            Ok(account) => account,
            Err(RepositoryError::NotFound) => {
                error!("❌ User not found with ID={}", acting.account_id);

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
            error!(
                "❌ Banned account {} tried to purchase a subscription",
                acting.account_id
            );

            self.record_error(method, started, "Banned account").await;
            return Err(ServiceError::Forbidden(
                "Banned users cannot purchase subscriptions".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();

        if account.has_active_subscription(now) {
            error!(
                "❌ Account {} already has an active subscription",
                acting.account_id
            );

            self.record_error(method, started, "Subscription already active")
                .await;
            return Err(ServiceError::Conflict(
                "Subscription already active".to_string(),
            ));
        }

        let lines = match tx.order_lines(req.id_order).await {
            Ok(lines) => lines,
            Err(e) => {
                error!("❌ Failed to fetch template order lines: {e:?}");

                self.record_error(method, started, "Failed to fetch order lines")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if lines.is_empty() {
            self.record_error(method, started, "Empty template order")
                .await;
            return Err(ServiceError::BadRequest(
                "Cannot subscribe from an empty order".to_string(),
            ));
        }

        // Snapshot prices from the template, so the subscription costs
        // exactly days times the template total.
        let order_cost: i64 = lines.iter().map(|line| line.line_total()).sum();
        let total_cost = order_cost * req.days as i64;

        if account.balance < total_cost {
            error!(
                "❌ Not enough balance for user_id={}, needed={total_cost}, available={}",
                acting.account_id, account.balance
            );

            self.record_error(method, started, "Insufficient balance")
                .await;
            return Err(ServiceError::InsufficientFunds {
                needed: total_cost,
                available: account.balance,
            });
        }

        let new_balance = match tx.debit_balance(acting.account_id, total_cost).await {
            Ok(balance) => balance,
            Err(RepositoryError::InsufficientFunds) => {
                self.record_error(method, started, "Insufficient balance")
                    .await;
                return Err(ServiceError::InsufficientFunds {
                    needed: total_cost,
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

        info!(
            "✅ Debited {total_cost} kopecks from user {}, balance now {new_balance}",
            acting.account_id
        );

        let records: Vec<OrderLineRecord> = lines
            .iter()
            .map(|line| OrderLineRecord {
                dish_id: line.dish_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();

        let today = now.date();
        let dates = schedule_dates(today, req.days);

        for date in &dates {
            let order = match tx
                .insert_order(acting.account_id, date.and_time(NaiveTime::MIN))
                .await
            {
                Ok(order) => order,
                Err(e) => {
                    error!("❌ Failed to insert subscription order for {date}: {e:?}");

                    self.record_error(method, started, "Failed to insert subscription order")
                        .await;
                    return Err(ServiceError::Repo(e));
                }
            };

            if let Err(e) = tx.insert_order_lines(order.order_id, &records).await {
                error!("❌ Failed to insert subscription order lines: {e:?}");

                self.record_error(method, started, "Failed to insert subscription order lines")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        }

        // The stored span is in calendar days, weekends included, so
        // the window covers every scheduled date.
        let span = match dates.last() {
            Some(last) => (*last - today).num_days() as i32,
            None => 0,
        };

        if let Err(e) = tx.set_subscription(acting.account_id, Some(now), span).await {
            error!("❌ Failed to store subscription window: {e:?}");

            self.record_error(method, started, "Failed to store subscription")
                .await;
            return Err(ServiceError::Repo(e));
        }

        if let Err(e) = tx.commit().await {
            self.record_error(method, started, "Failed to commit subscription")
                .await;
            return Err(ServiceError::Repo(e));
        }

        info!(
            "✅ Subscription purchased for user {}: {} orders, {total_cost} kopecks",
            acting.account_id,
            dates.len()
        );

        if let Err(e) = self
            .notifier
            .notify_role(
                UserRole::Cook,
                "Subscription purchased",
                &format!(
                    "{} subscription orders scheduled for user {}",
                    dates.len(),
                    acting.account_id
                ),
            )
            .await
        {
            error!("❌ Failed to notify cooks about subscription: {e:?}");
        }

        let subscription =
            SubscriptionResponse::compute(acting.account_id, Some(now), span, now);

        self.record_success(method, started, "Subscription purchased")
            .await;

        Ok(ApiResponse {
            status: "success".to_string(),
            message: "Subscription purchased successfully".to_string(),
            data: PurchaseSubscriptionResponse {
                subscription,
                created_orders: dates.len() as i32,
                total_cost,
            },
        })
    }

    async fn cancel(
        &self,
        acting: AuthContext,
    ) -> Result<ApiResponse<CancelSubscriptionResponse>, ServiceError> {
        info!("🗑️ Cancelling subscription for account {}", acting.account_id);

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

        let now = Utc::now().naive_utc();

        // Only strictly future days are refunded. Today's order stays
        // on the kitchen's list.
        let cutoff = (now.date() + Duration::days(1)).and_time(NaiveTime::MIN);

        let orders = match tx.paid_orders_from(acting.account_id, cutoff).await {
            Ok(orders) => orders,
            Err(e) => {
                error!("❌ Failed to fetch future orders: {e:?}");

                self.record_error(method, started, "Failed to fetch future orders")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        let account = match tx.account_for_update(acting.account_id).await {
            Ok(account) => account,
            Err(RepositoryError::NotFound) => {
                error!("❌ User not found with ID={}", acting.account_id);

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

        if !account.has_active_subscription(now) {
            error!(
                "❌ Account {} has no active subscription to cancel",
                acting.account_id
            );

            self.record_error(method, started, "No active subscription")
                .await;
            return Err(ServiceError::BadRequest(
                "No active subscription".to_string(),
            ));
        }

        let order_ids: Vec<i32> = orders.iter().map(|o| o.order_id).collect();

        for order_id in &order_ids {
            if let Err(e) = tx
                .update_status(*order_id, OrderStatus::Cancelled, Some(now))
                .await
            {
                error!("❌ Failed to cancel order {order_id}: {e:?}");

                self.record_error(method, started, "Failed to cancel order")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        }

        let refund: i64 = if order_ids.is_empty() {
            0
        } else {
            let lines = match tx.lines_for_orders(&order_ids).await {
                Ok(lines) => lines,
                Err(e) => {
                    error!("❌ Failed to fetch lines for refund: {e:?}");

                    self.record_error(method, started, "Failed to fetch lines for refund")
                        .await;
                    return Err(ServiceError::Repo(e));
                }
            };

            lines.iter().map(|line| line.line_total()).sum()
        };

        if refund > 0 {
            match tx.credit_balance(acting.account_id, refund).await {
                Ok(balance) => {
                    info!(
                        "✅ Refunded {refund} kopecks to user {}, balance now {balance}",
                        acting.account_id
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

        if let Err(e) = tx.set_subscription(acting.account_id, None, 0).await {
            error!("❌ Failed to clear subscription window: {e:?}");

            self.record_error(method, started, "Failed to clear subscription")
                .await;
            return Err(ServiceError::Repo(e));
        }

        if let Err(e) = tx.commit().await {
            self.record_error(method, started, "Failed to commit cancellation")
                .await;
            return Err(ServiceError::Repo(e));
        }

        info!(
            "✅ Subscription cancelled for user {}: {} orders, {refund} kopecks refunded",
            acting.account_id,
            order_ids.len()
        );

        self.record_success(method, started, "Subscription cancelled")
            .await;

        Ok(ApiResponse {
            status: "success".to_string(),
            message: "Subscription cancelled successfully".to_string(),
            data: CancelSubscriptionResponse {
                refunded: refund,
                cancelled_orders: order_ids.len() as i32,
            },
        })
    }

    async fn my_subscription(
        &self,
        acting: AuthContext,
    ) -> Result<ApiResponse<SubscriptionResponse>, ServiceError> {
        info!("🔍 Fetching subscription for account {}", acting.account_id);

        let method = Method::Get;
        let started = Instant::now();

        let user = match self.user_query.find_by_id(acting.account_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                error!("❌ User not found with ID={}", acting.account_id);

                self.record_error(method, started, "User not found").await;
                return Err(ServiceError::NotFound("User".to_string()));
            }
            Err(e) => {
                error!("❌ Failed to fetch user: {e:?}");

                self.record_error(method, started, "Failed to fetch user")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        let now = Utc::now().naive_utc();
        let response = SubscriptionResponse::compute(
            user.user_id,
            user.subscription_start,
            user.subscription_days,
            now,
        );

        self.record_success(method, started, "Subscription retrieved")
            .await;

        Ok(ApiResponse {
            status: "success".to_string(),
            message: "Subscription retrieved successfully".to_string(),
            data: response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn schedules_starting_tomorrow() {
        // 2025-01-06 is a Monday.
        let dates = schedule_dates(date(2025, 1, 6), 4);

        assert_eq!(
            dates,
            vec![
                date(2025, 1, 7),
                date(2025, 1, 8),
                date(2025, 1, 9),
                date(2025, 1, 10),
            ]
        );
    }

    #[test]
    fn skips_weekends() {
        // 2025-01-10 is a Friday; the next two weekdays are Mon and Tue.
        let dates = schedule_dates(date(2025, 1, 10), 2);

        assert_eq!(dates, vec![date(2025, 1, 13), date(2025, 1, 14)]);
    }

    #[test]
    fn starts_on_monday_when_bought_on_saturday() {
        let dates = schedule_dates(date(2025, 1, 11), 1);

        assert_eq!(dates, vec![date(2025, 1, 13)]);
    }

    #[test]
    fn five_days_span_a_whole_week() {
        let from = date(2025, 1, 6);
        let dates = schedule_dates(from, 5);

        assert_eq!(dates.len(), 5);
        // Mon 13th: four weekdays then the weekend pushes the fifth out.
        assert_eq!(dates.last().copied(), Some(date(2025, 1, 13)));
        assert_eq!((date(2025, 1, 13) - from).num_days(), 7);
    }

    #[test]
    fn never_lands_on_a_weekend() {
        let dates = schedule_dates(date(2025, 3, 1), 20);

        assert_eq!(dates.len(), 20);
        assert!(
            dates
                .iter()
                .all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        );
    }

    #[test]
    fn zero_days_schedules_nothing() {
        assert!(schedule_dates(date(2025, 1, 6), 0).is_empty());
    }
}
