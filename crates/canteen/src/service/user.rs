use crate::{
    abstract_trait::{AccountServiceTrait, DynLedgerStore, DynUserQueryRepository},
    domain::{
        requests::TopUpRequest,
        response::{BalanceResponse, UserResponse},
    },
};
use async_trait::async_trait;
use prometheus_client::registry::Registry;
use shared::{
    domain::responses::ApiResponse,
    errors::{RepositoryError, ServiceError},
    model::AuthContext,
    utils::{Method, Metrics, Status as StatusUtils},
};
use std::sync::Arc;
use tokio::{sync::Mutex, time::Instant};
use tracing::{error, info};

pub struct AccountService {
    pub user_query: DynUserQueryRepository,
    pub ledger: DynLedgerStore,
    pub metrics: Arc<Mutex<Metrics>>,
}

pub struct AccountServiceDeps {
    pub user_query: DynUserQueryRepository,
    pub ledger: DynLedgerStore,
    pub metrics: Arc<Mutex<Metrics>>,
    pub registry: Arc<Mutex<Registry>>,
}

impl AccountService {
    pub async fn new(deps: AccountServiceDeps) -> Self {
        let AccountServiceDeps {
            user_query,
            ledger,
            metrics,
            registry,
        } = deps;

        registry.lock().await.register(
            "account_request_counter",
            "Total number of requests to the AccountService",
            metrics.lock().await.request_counter.clone(),
        );
        registry.lock().await.register(
            "account_request_duration",
            "Histogram of request durations for the AccountService",
            metrics.lock().await.request_duration.clone(),
        );

        Self {
            user_query,
            ledger,
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
impl AccountServiceTrait for AccountService {
    async fn me(&self, acting: AuthContext) -> Result<ApiResponse<UserResponse>, ServiceError> {
        info!("🔍 Fetching profile for account {}", acting.account_id);

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

        self.record_success(method, started, "Profile retrieved").await;

        Ok(ApiResponse {
            status: "success".to_string(),
            message: "Profile retrieved successfully".to_string(),
            data: UserResponse::from(user),
        })
    }

    async fn top_up(
        &self,
        acting: AuthContext,
        req: &TopUpRequest,
    ) -> Result<ApiResponse<BalanceResponse>, ServiceError> {
        info!(
            "💰 Topping up account {} by {} kopecks",
            acting.account_id, req.amount
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

        let balance = match tx.credit_balance(acting.account_id, req.amount).await {
            Ok(balance) => balance,
            Err(RepositoryError::NotFound) => {
                error!("❌ User not found with ID={}", acting.account_id);

                self.record_error(method, started, "User not found").await;
                return Err(ServiceError::NotFound("User".to_string()));
            }
            Err(e) => {
                error!("❌ Failed to credit balance: {e:?}");

                self.record_error(method, started, "Failed to credit balance")
                    .await;
                return Err(ServiceError::Repo(e));
            }
        };

        if let Err(e) = tx.commit().await {
            self.record_error(method, started, "Failed to commit top-up")
                .await;
            return Err(ServiceError::Repo(e));
        }

        info!(
            "✅ Balance of user {} is now {balance} kopecks",
            acting.account_id
        );

        self.record_success(method, started, "Balance topped up").await;

        Ok(ApiResponse {
            status: "success".to_string(),
            message: "Balance topped up successfully".to_string(),
            data: BalanceResponse {
                user_id: acting.account_id,
                balance,
            },
        })
    }
}
