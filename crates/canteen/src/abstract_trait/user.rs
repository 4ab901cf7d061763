use crate::domain::{
    requests::TopUpRequest,
    response::{BalanceResponse, UserResponse},
};
use async_trait::async_trait;
use shared::{
    domain::responses::ApiResponse,
    errors::{RepositoryError, ServiceError},
    model::{AuthContext, User},
};
use std::sync::Arc;

pub type DynUserQueryRepository = Arc<dyn UserQueryRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait UserQueryRepositoryTrait {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, RepositoryError>;
}

pub type DynAccountService = Arc<dyn AccountServiceTrait + Send + Sync>;

#[async_trait]
pub trait AccountServiceTrait {
    async fn me(&self, acting: AuthContext) -> Result<ApiResponse<UserResponse>, ServiceError>;

    async fn top_up(
        &self,
        acting: AuthContext,
        req: &TopUpRequest,
    ) -> Result<ApiResponse<BalanceResponse>, ServiceError>;
}
