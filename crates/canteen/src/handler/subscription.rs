use crate::{
    abstract_trait::DynSubscriptionService,
    domain::{
        requests::PurchaseSubscriptionRequest,
        response::{
            CancelSubscriptionResponse, PurchaseSubscriptionResponse, SubscriptionResponse,
        },
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
    post,
    path = "/api/subscriptions/purchase",
    tag = "Subscription",
    security(("bearer_auth" = [])),
    request_body = PurchaseSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription purchased, weekday orders created", body = ApiResponse<PurchaseSubscriptionResponse>),
        (status = 400, description = "Cancelled template or insufficient balance"),
        (status = 403, description = "Foreign template order or banned account"),
        (status = 404, description = "Template order not found"),
        (status = 409, description = "Subscription already active"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn purchase_subscription(
    Extension(service): Extension<DynSubscriptionService>,
    Extension(auth): Extension<AuthContext>,
    SimpleValidatedJson(body): SimpleValidatedJson<PurchaseSubscriptionRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.purchase(auth, &body).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/cancel",
    tag = "Subscription",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Subscription cancelled, future orders refunded", body = ApiResponse<CancelSubscriptionResponse>),
        (status = 400, description = "No active subscription"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn cancel_subscription(
    Extension(service): Extension<DynSubscriptionService>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.cancel(auth).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/my",
    tag = "Subscription",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current subscription window", body = ApiResponse<SubscriptionResponse>),
        (status = 404, description = "User not found"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_my_subscription(
    Extension(service): Extension<DynSubscriptionService>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.my_subscription(auth).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn subscription_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/api/subscriptions/purchase", post(purchase_subscription))
        .route("/api/subscriptions/cancel", post(cancel_subscription))
        .route("/api/subscriptions/my", get(get_my_subscription))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(app_state.di_container.subscription.clone()))
        .layer(Extension(app_state.di_container.user_query.clone()))
        .layer(Extension(app_state.jwt_config.clone()))
}
