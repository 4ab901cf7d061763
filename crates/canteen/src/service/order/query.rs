use crate::{
    abstract_trait::{DynOrderQueryRepository, OrderQueryServiceTrait},
    domain::{
        requests::FindAllOrders,
        response::{OrderDetailResponse, OrderLineResponse, OrderResponse},
    },
};
use async_trait::async_trait;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::{ApiResponse, ApiResponsePagination, Pagination},
    errors::ServiceError,
    model::AuthContext,
    utils::{Method, Metrics, Status as StatusUtils},
};
use std::sync::Arc;
use tokio::{sync::Mutex, time::Instant};
use tracing::{error, info};

pub struct OrderQueryService {
    pub query: DynOrderQueryRepository,
    pub metrics: Arc<Mutex<Metrics>>,
}

pub struct OrderQueryServiceDeps {
    pub query: DynOrderQueryRepository,
    pub metrics: Arc<Mutex<Metrics>>,
    pub registry: Arc<Mutex<Registry>>,
}

impl OrderQueryService {
    pub async fn new(deps: OrderQueryServiceDeps) -> Self {
        let OrderQueryServiceDeps {
            query,
            metrics,
            registry,
        } = deps;

        registry.lock().await.register(
            "order_query_request_counter",
            "Total number of requests to the OrderQueryService",
            metrics.lock().await.request_counter.clone(),
        );
        registry.lock().await.register(
            "order_query_request_duration",
            "Histogram of request durations for the OrderQueryService",
            metrics.lock().await.request_duration.clone(),
        );

        Self { query, metrics }
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
impl OrderQueryServiceTrait for OrderQueryService {
    async fn find_all(
        &self,
        acting: AuthContext,
        req: &FindAllOrders,
    ) -> Result<ApiResponsePagination<Vec<OrderResponse>>, ServiceError> {
        info!(
            "📦 Finding all orders | Page: {}, Size: {}, Status: {:?}",
            req.page, req.page_size, req.status
        );

        let method = Method::Get;
        let started = Instant::now();

        let mut scoped = req.clone();
        scoped.page = if req.page > 0 { req.page } else { 1 };
        scoped.page_size = if req.page_size > 0 { req.page_size } else { 10 };

        // Students only ever see their own orders, whatever the filter says.
        if !acting.is_staff() {
            scoped.user_id = Some(acting.account_id);
        }

        let (orders, total) = match self.query.find_all(&scoped).await {
            Ok(res) => {
                info!("✅ Found {} orders (total: {})", res.0.len(), res.1);
                res
            }
            Err(e) => {
                error!("❌ Failed to find orders: {e:?}");

                self.record_error(method, started, "Failed to find orders")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        let order_response: Vec<OrderResponse> =
            orders.into_iter().map(OrderResponse::from).collect();

        let total_pages = ((total - 1) / scoped.page_size as i64) + 1;

        let pagination = Pagination {
            page: scoped.page,
            page_size: scoped.page_size,
            total_items: total as i32,
            total_pages: total_pages as i32,
        };

        self.record_success(method, started, "Orders retrieved").await;

        Ok(ApiResponsePagination {
            status: "success".to_string(),
            message: "Orders retrieved successfully".to_string(),
            data: order_response,
            pagination,
        })
    }

    async fn find_by_id(
        &self,
        acting: AuthContext,
        order_id: i32,
    ) -> Result<ApiResponse<OrderDetailResponse>, ServiceError> {
        info!("🆔 Finding order by ID: {order_id}");

        let method = Method::Get;
        let started = Instant::now();

        let order = match self.query.find_by_id(order_id).await {
            Ok(Some(order)) => {
                info!("✅ Found order by ID: {order_id}");
                order
            }
            Ok(None) => {
                error!("❌ Order not found with ID={order_id}");

                self.record_error(method, started, "Order not found").await;
                return Err(ServiceError::NotFound("Order".to_string()));
            }
            Err(e) => {
                error!("❌ Database error while finding order ID {order_id}: {e:?}");

                self.record_error(method, started, "Database error").await;
                return Err(ServiceError::Repo(e));
            }
        };

        if !acting.is_staff() && order.user_id != acting.account_id {
            self.record_error(method, started, "Order view denied").await;
            return Err(ServiceError::Forbidden(
                "You can only view your own orders".to_string(),
            ));
        }

        let lines = match self.query.find_lines(order_id).await {
            Ok(lines) => lines,
            Err(e) => {
                error!("❌ Failed to fetch lines for order {order_id}: {e:?}");

                self.record_error(method, started, "Failed to fetch order lines")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        let line_responses: Vec<OrderLineResponse> =
            lines.into_iter().map(OrderLineResponse::from).collect();

        let response = OrderDetailResponse::new(order, line_responses);

        self.record_success(method, started, "Order retrieved").await;

        Ok(ApiResponse {
            status: "success".to_string(),
            message: "Order retrieved successfully".to_string(),
            data: response,
        })
    }
}
