mod order;
mod subscription;
mod user;

use crate::state::AppState;
use anyhow::Result;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use prometheus_client::encoding::text::encode;
use shared::utils::shutdown_signal;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::{Modify, OpenApi, openapi::security::SecurityScheme};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub use self::order::order_routes;
pub use self::subscription::subscription_routes;
pub use self::user::user_routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        order::get_orders,
        order::get_order,
        order::create_order,
        order::cancel_order_handler,
        order::mark_ready_handler,
        order::serve_order_handler,
        order::confirm_receipt_handler,

        subscription::purchase_subscription,
        subscription::cancel_subscription,
        subscription::get_my_subscription,

        user::get_me,
        user::top_up_balance,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Order", description = "Order endpoints"),
        (name = "Subscription", description = "Subscription endpoints"),
        (name = "User", description = "Account endpoints"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut buffer = String::new();

    let registry = state.registry.lock().await;

    if let Err(e) = encode(&mut buffer, &registry) {
        return Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Body::from(format!("Failed to encode metrics: {e}")))
            .unwrap();
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(
            CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )
        .body(Body::from(buffer))
        .unwrap()
}

pub async fn health_check_handler() -> &'static str {
    "OK"
}

pub struct AppRouter;

impl AppRouter {
    pub async fn serve(port: u16, app_state: AppState) -> Result<()> {
        let shared_state = Arc::new(app_state);

        let api_router = OpenApiRouter::with_openapi(ApiDoc::openapi())
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_check_handler))
            .with_state(shared_state.clone())
            .merge(order_routes(shared_state.clone()))
            .merge(subscription_routes(shared_state.clone()))
            .merge(user_routes(shared_state.clone()));

        let router_with_layers = api_router
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024));

        let (app_router, api) = router_with_layers.split_for_parts();

        let app = app_router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()));

        let addr = format!("0.0.0.0:{port}");
        let listener = TcpListener::bind(&addr).await?;

        println!("🚀 Server running on http://{}", listener.local_addr()?);
        println!("📚 API Documentation available at:");
        println!("   📖 Swagger UI: http://localhost:{port}/swagger-ui");
        println!("   📊 Metrics: http://localhost:{port}/metrics");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .unwrap();

        Ok(())
    }
}
