use axum::{
    http::{header, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod orders;
pub mod pricing;
pub mod state;

pub use state::{AppState, AuthConfig};

use crate::middleware::auth::{admin_auth_middleware, user_auth_middleware};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::COOKIE]);

    let public = Router::new()
        .route("/health", get(health))
        .route("/api/pricing/compute", post(pricing::compute_price))
        .route("/api/orders", post(orders::create_order));

    let user = Router::new()
        .route("/api/orders/user", get(orders::list_my_orders))
        .route_layer(from_fn_with_state(state.clone(), user_auth_middleware));

    let admin = Router::new()
        .route("/api/pricing/rules", get(admin::list_rules).post(admin::create_rule))
        .route(
            "/api/pricing/rules/{id}",
            get(admin::get_rule).put(admin::update_rule).delete(admin::delete_rule),
        )
        .route("/api/pricing/rules/{id}/reactivate", post(admin::reactivate_rule))
        .route("/api/orders", get(admin::list_orders))
        .route("/api/orders/{id}", get(admin::get_order))
        .route("/api/orders/{id}/status", put(admin::update_order_status))
        .route("/api/admin/orders/stream", get(admin::order_stream))
        .route_layer(from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .merge(public)
        .merge(user)
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "pandizot-api" }))
}
