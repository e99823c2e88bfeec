use std::collections::BTreeMap;
use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{Stream, StreamExt};
use pandizot_catalog::{NewPricingRule, PricingRule, RulePatch, SpeakerType};
use pandizot_order::{Order, OrderStatus};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

// ============================================================================
// Pricing Rules
// ============================================================================

/// Admin forms send multipliers and the tweeter price grouped together.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MultipliersInput {
    pub speaker_type: Option<BTreeMap<SpeakerType, f64>>,
    pub tweeter_unit_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePricingRuleRequest {
    #[serde(default)]
    pub vehicle_brand: String,
    #[serde(default)]
    pub vehicle_model: String,
    pub base_price: Option<f64>,
    #[serde(default)]
    pub multipliers: MultipliersInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePricingRuleRequest {
    pub vehicle_brand: Option<String>,
    pub vehicle_model: Option<String>,
    pub base_price: Option<f64>,
    #[serde(default)]
    pub multipliers: MultipliersInput,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRulesQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Serialize)]
pub struct RuleResponse {
    pub message: String,
    pub rule: PricingRule,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/pricing/rules
pub async fn list_rules(
    State(state): State<AppState>,
    Query(query): Query<ListRulesQuery>,
) -> Result<Json<Vec<PricingRule>>, AppError> {
    let rules = state.pricing.list_rules(query.include_inactive).await?;
    Ok(Json(rules))
}

/// POST /api/pricing/rules
pub async fn create_rule(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreatePricingRuleRequest>,
) -> Result<(StatusCode, Json<RuleResponse>), AppError> {
    let base_price = req
        .base_price
        .ok_or_else(|| AppError::ValidationError("basePrice is required".to_string()))?;

    let rule = state
        .pricing
        .create_rule(NewPricingRule {
            vehicle_brand: req.vehicle_brand,
            vehicle_model: req.vehicle_model,
            base_price,
            speaker_type_multipliers: req.multipliers.speaker_type.unwrap_or_default(),
            tweeter_unit_price: req.multipliers.tweeter_unit_price.unwrap_or(0.0),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RuleResponse {
            message: "Pricing rule created.".to_string(),
            rule,
        }),
    ))
}

/// GET /api/pricing/rules/{id}
pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PricingRule>, AppError> {
    Ok(Json(state.pricing.get_rule(id).await?))
}

/// PUT /api/pricing/rules/{id}
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdatePricingRuleRequest>,
) -> Result<Json<RuleResponse>, AppError> {
    let patch = RulePatch {
        vehicle_brand: req.vehicle_brand,
        vehicle_model: req.vehicle_model,
        base_price: req.base_price,
        speaker_type_multipliers: req.multipliers.speaker_type,
        tweeter_unit_price: req.multipliers.tweeter_unit_price,
        is_active: req.is_active,
    };

    let rule = state.pricing.update_rule(id, patch).await?;

    Ok(Json(RuleResponse {
        message: "Pricing rule updated.".to_string(),
        rule,
    }))
}

/// DELETE /api/pricing/rules/{id}
///
/// Soft delete: the rule is kept for history and stops matching.
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.pricing.deactivate_rule(id).await?;

    Ok(Json(MessageResponse {
        message: "Pricing rule deactivated.".to_string(),
    }))
}

/// POST /api/pricing/rules/{id}/reactivate
pub async fn reactivate_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RuleResponse>, AppError> {
    let rule = state.pricing.reactivate_rule(id).await?;

    Ok(Json(RuleResponse {
        message: "Pricing rule reactivated.".to_string(),
        rule,
    }))
}

// ============================================================================
// Orders
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub message: String,
    pub order: Order,
}

/// GET /api/orders
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, AppError> {
    Ok(Json(state.orders.list_orders().await?))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.orders.get_order(id).await?))
}

/// PUT /api/orders/{id}/status
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.orders.update_status(id, req.status).await?;

    Ok(Json(OrderResponse {
        message: "Order status updated.".to_string(),
        order,
    }))
}

/// GET /api/admin/orders/stream
///
/// Server-sent events for new orders and status changes. Slow clients skip
/// whatever they lagged behind on.
pub async fn order_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.orders.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => match Event::default()
                .event(event.name())
                .id(event.order_id().to_string())
                .json_data(&event)
            {
                Ok(sse_event) => Some(Ok(sse_event)),
                Err(e) => {
                    warn!("Failed to encode order event: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Order stream lagged: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
