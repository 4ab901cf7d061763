use crate::domain::{
    requests::{CreateOrderRequest, FindAllOrders},
    response::{OrderDetailResponse, OrderResponse},
};
use async_trait::async_trait;
use shared::{
    domain::responses::{ApiResponse, ApiResponsePagination},
    errors::ServiceError,
    model::AuthContext,
};
use std::sync::Arc;

pub type DynOrderCommandService = Arc<dyn OrderCommandServiceTrait + Send + Sync>;

#[async_trait]
pub trait OrderCommandServiceTrait {
    async fn create_order(
        &self,
        acting: AuthContext,
        req: &CreateOrderRequest,
    ) -> Result<ApiResponse<OrderDetailResponse>, ServiceError>;

    async fn mark_ready(
        &self,
        acting: AuthContext,
        order_id: i32,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError>;

    async fn mark_served(
        &self,
        acting: AuthContext,
        order_id: i32,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError>;

    async fn cancel_order(
        &self,
        acting: AuthContext,
        order_id: i32,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError>;
}

pub type DynOrderQueryService = Arc<dyn OrderQueryServiceTrait + Send + Sync>;

#[async_trait]
pub trait OrderQueryServiceTrait {
    async fn find_all(
        &self,
        acting: AuthContext,
        req: &FindAllOrders,
    ) -> Result<ApiResponsePagination<Vec<OrderResponse>>, ServiceError>;

    async fn find_by_id(
        &self,
        acting: AuthContext,
        order_id: i32,
    ) -> Result<ApiResponse<OrderDetailResponse>, ServiceError>;
}
