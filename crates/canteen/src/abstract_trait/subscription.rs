use crate::domain::{
    requests::PurchaseSubscriptionRequest,
    response::{CancelSubscriptionResponse, PurchaseSubscriptionResponse, SubscriptionResponse},
};
use async_trait::async_trait;
use shared::{domain::responses::ApiResponse, errors::ServiceError, model::AuthContext};
use std::sync::Arc;

pub type DynSubscriptionService = Arc<dyn SubscriptionServiceTrait + Send + Sync>;

#[async_trait]
pub trait SubscriptionServiceTrait {
    async fn purchase(
        &self,
        acting: AuthContext,
        req: &PurchaseSubscriptionRequest,
    ) -> Result<ApiResponse<PurchaseSubscriptionResponse>, ServiceError>;

    async fn cancel(
        &self,
        acting: AuthContext,
    ) -> Result<ApiResponse<CancelSubscriptionResponse>, ServiceError>;

    async fn my_subscription(
        &self,
        acting: AuthContext,
    ) -> Result<ApiResponse<SubscriptionResponse>, ServiceError>;
}
