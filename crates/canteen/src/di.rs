use crate::{
    abstract_trait::{
        DynAccountService, DynDishQueryRepository, DynLedgerStore,
        DynNotificationCommandRepository, DynNotifier, DynOrderCommandService,
        DynOrderQueryRepository, DynOrderQueryService, DynSubscriptionService,
        DynUserQueryRepository,
    },
    repository::{
        DishQueryRepository, NotificationCommandRepository, OrderQueryRepository, PgLedgerStore,
        UserQueryRepository,
    },
    service::{
        AccountService, AccountServiceDeps, NotificationService, OrderCommandService,
        OrderCommandServiceDeps, OrderQueryService, OrderQueryServiceDeps, SubscriptionService,
        SubscriptionServiceDeps,
    },
};
use anyhow::Result;
use prometheus_client::registry::Registry;
use shared::{config::ConnectionPool, utils::Metrics};
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct DependenciesInject {
    pub order_command: DynOrderCommandService,
    pub order_query: DynOrderQueryService,
    pub subscription: DynSubscriptionService,
    pub account: DynAccountService,
    pub user_query: DynUserQueryRepository,
}

impl fmt::Debug for DependenciesInject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependenciesInject")
            .field("order_command", &"OrderCommandService")
            .field("order_query", &"OrderQueryService")
            .field("subscription", &"SubscriptionService")
            .field("account", &"AccountService")
            .finish()
    }
}

impl DependenciesInject {
    pub async fn new(pool: ConnectionPool, registry: Arc<Mutex<Registry>>) -> Result<Self> {
        let ledger: DynLedgerStore = Arc::new(PgLedgerStore::new(pool.clone()));

        let order_query_repo: DynOrderQueryRepository =
            Arc::new(OrderQueryRepository::new(pool.clone()));
        let dish_query: DynDishQueryRepository = Arc::new(DishQueryRepository::new(pool.clone()));
        let user_query: DynUserQueryRepository = Arc::new(UserQueryRepository::new(pool.clone()));
        let notification_repo: DynNotificationCommandRepository =
            Arc::new(NotificationCommandRepository::new(pool.clone()));

        let notifier: DynNotifier = Arc::new(NotificationService::new(notification_repo));

        let order_command: DynOrderCommandService = Arc::new(
            OrderCommandService::new(OrderCommandServiceDeps {
                ledger: ledger.clone(),
                dish_query: dish_query.clone(),
                notifier: notifier.clone(),
                metrics: Arc::new(Mutex::new(Metrics::new())),
                registry: registry.clone(),
            })
            .await,
        );

        let order_query: DynOrderQueryService = Arc::new(
            OrderQueryService::new(OrderQueryServiceDeps {
                query: order_query_repo.clone(),
                metrics: Arc::new(Mutex::new(Metrics::new())),
                registry: registry.clone(),
            })
            .await,
        );

        let subscription: DynSubscriptionService = Arc::new(
            SubscriptionService::new(SubscriptionServiceDeps {
                ledger: ledger.clone(),
                user_query: user_query.clone(),
                notifier: notifier.clone(),
                metrics: Arc::new(Mutex::new(Metrics::new())),
                registry: registry.clone(),
            })
            .await,
        );

        let account: DynAccountService = Arc::new(
            AccountService::new(AccountServiceDeps {
                user_query: user_query.clone(),
                ledger: ledger.clone(),
                metrics: Arc::new(Mutex::new(Metrics::new())),
                registry: registry.clone(),
            })
            .await,
        );

        Ok(Self {
            order_command,
            order_query,
            subscription,
            account,
            user_query,
        })
    }
}
