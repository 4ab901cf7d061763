use crate::{
    abstract_trait::DynAccountService,
    domain::{
        requests::TopUpRequest,
        response::{BalanceResponse, UserResponse},
    },
    middleware::{jwt::auth_middleware, validate::SimpleValidatedJson},
    state::AppState,
};
use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use shared::{domain::responses::ApiResponse, errors::HttpError, model::AuthContext};
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "User",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile of the acting account", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_me(
    Extension(service): Extension<DynAccountService>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.me(auth).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/users/me/top-up",
    tag = "User",
    security(("bearer_auth" = [])),
    request_body = TopUpRequest,
    responses(
        (status = 200, description = "Balance credited", body = ApiResponse<BalanceResponse>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "User not found"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn top_up_balance(
    Extension(service): Extension<DynAccountService>,
    Extension(auth): Extension<AuthContext>,
    SimpleValidatedJson(body): SimpleValidatedJson<TopUpRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.top_up(auth, &body).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn user_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/api/users/me", get(get_me))
        .route("/api/users/me/top-up", post(top_up_balance))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(app_state.di_container.account.clone()))
        .layer(Extension(app_state.di_container.user_query.clone()))
        .layer(Extension(app_state.jwt_config.clone()))
}
