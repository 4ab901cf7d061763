use crate::{
    abstract_trait::{DynOrderCommandService, DynOrderQueryService},
    domain::{
        requests::{CreateOrderRequest, FindAllOrders},
        response::{OrderDetailResponse, OrderResponse},
    },
    middleware::{jwt::auth_middleware, validate::SimpleValidatedJson},
    state::AppState,
};
use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use shared::{
    domain::responses::{ApiResponse, ApiResponsePagination},
    errors::HttpError,
    model::AuthContext,
};
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(FindAllOrders),
    responses(
        (status = 200, description = "List of orders", body = ApiResponsePagination<Vec<OrderResponse>>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_orders(
    Extension(service): Extension<DynOrderQueryService>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<FindAllOrders>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.find_all(auth, &params).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order details with dishes", body = ApiResponse<OrderDetailResponse>),
        (status = 403, description = "Not your order"),
        (status = 404, description = "Order not found"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_order(
    Extension(service): Extension<DynOrderQueryService>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.find_by_id(auth, id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Order",
    security(("bearer_auth" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created and paid", body = ApiResponse<OrderDetailResponse>),
        (status = 400, description = "Validation error or insufficient balance"),
        (status = 403, description = "Banned or ordering for someone else"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_order(
    Extension(service): Extension<DynOrderCommandService>,
    Extension(auth): Extension<AuthContext>,
    SimpleValidatedJson(body): SimpleValidatedJson<CreateOrderRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.create_order(auth, &body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled and refunded", body = ApiResponse<OrderResponse>),
        (status = 403, description = "Not your order"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already served or cancelled"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn cancel_order_handler(
    Extension(service): Extension<DynOrderCommandService>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.cancel_order(auth, id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/mark-ready",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order marked as prepared", body = ApiResponse<OrderResponse>),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is not in paid status"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn mark_ready_handler(
    Extension(service): Extension<DynOrderCommandService>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.mark_ready(auth, id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/serve",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order handed out", body = ApiResponse<OrderResponse>),
        (status = 403, description = "Not your order"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already served or cancelled"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn serve_order_handler(
    Extension(service): Extension<DynOrderCommandService>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.mark_served(auth, id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/confirm-receipt",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Receipt confirmed, order served", body = ApiResponse<OrderResponse>),
        (status = 403, description = "Not your order"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already served or cancelled"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn confirm_receipt_handler(
    Extension(service): Extension<DynOrderCommandService>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.mark_served(auth, id).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn order_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/api/orders", get(get_orders))
        .route("/api/orders", post(create_order))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/cancel", post(cancel_order_handler))
        .route("/api/orders/{id}/mark-ready", post(mark_ready_handler))
        .route("/api/orders/{id}/serve", post(serve_order_handler))
        .route(
            "/api/orders/{id}/confirm-receipt",
            post(confirm_receipt_handler),
        )
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(app_state.di_container.order_command.clone()))
        .layer(Extension(app_state.di_container.order_query.clone()))
        .layer(Extension(app_state.di_container.user_query.clone()))
        .layer(Extension(app_state.jwt_config.clone()))
}
