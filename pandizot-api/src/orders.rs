use axum::{
    extract::State,
    http::HeaderMap,
    Extension, Json,
};
use pandizot_core::PlaceOrder;
use pandizot_order::{LineConfiguration, Order, ShippingAddress};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::middleware::auth::{optional_claims, Claims};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<LineConfiguration>,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_guest: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub message: String,
    pub order_id: Uuid,
    pub total: i64,
}

/// POST /api/orders
///
/// Signed-in customers order under their account email. Guests (or a request
/// flagged `isGuest`) must put an email on the shipping address.
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let claims = if req.is_guest {
        None
    } else {
        optional_claims(&state.auth, &headers)
    };

    let (user_id, email) = match claims {
        Some(claims) => (Some(claims.sub), Some(claims.email)),
        None => (
            None,
            req.shipping_address.email.as_ref().map(|e| e.expose().clone()),
        ),
    };

    let order = state
        .orders
        .place_order(PlaceOrder {
            user_id,
            email,
            lines: req.items,
            shipping_address: req.shipping_address,
            notes: req.notes,
        })
        .await?;

    Ok(Json(CreateOrderResponse {
        message: "Order created.".to_string(),
        order_id: order.id,
        total: order.total,
    }))
}

/// GET /api/orders/user
pub async fn list_my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.orders.list_user_orders(&claims.sub).await?))
}
