use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order events fanned out to admin dashboards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    OrderCreated {
        order_id: Uuid,
        user_id: Option<String>,
        total: i64,
        item_count: usize,
        timestamp: i64,
    },
    OrderStatusChanged {
        order_id: Uuid,
        from: String,
        to: String,
        timestamp: i64,
    },
}

impl OrderEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated { .. } => "order_created",
            OrderEvent::OrderStatusChanged { .. } => "order_status_changed",
        }
    }

    pub fn order_id(&self) -> Uuid {
        match self {
            OrderEvent::OrderCreated { order_id, .. } => *order_id,
            OrderEvent::OrderStatusChanged { order_id, .. } => *order_id,
        }
    }
}
