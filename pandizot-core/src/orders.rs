use std::sync::Arc;

use chrono::Utc;
use pandizot_order::{LineConfiguration, NewOrder, Order, OrderError, OrderItem, OrderStatus, ShippingAddress};
use pandizot_shared::OrderEvent;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::pricing::PricingService;
use crate::repository::OrderRepository;
use crate::{CoreError, CoreResult};

/// Checkout input. Lines are priced server-side.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub lines: Vec<LineConfiguration>,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
}

/// Order intake and lifecycle.
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    pricing: Arc<PricingService>,
    events: broadcast::Sender<OrderEvent>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        pricing: Arc<PricingService>,
        events: broadcast::Sender<OrderEvent>,
    ) -> Self {
        Self { orders, pricing, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.events.subscribe()
    }

    pub async fn place_order(&self, request: PlaceOrder) -> CoreResult<Order> {
        if request.lines.is_empty() {
            return Err(OrderError::EmptyOrder.into());
        }
        let email = request.email.ok_or(OrderError::MissingEmail)?;

        let mut items = Vec::with_capacity(request.lines.len());
        for line in request.lines {
            line.validate()?;
            let unit_price = self.pricing.compute_price(&line.price_query()).await?;
            items.push(OrderItem::priced(line, unit_price)?);
        }

        let order = Order::new(NewOrder {
            user_id: request.user_id,
            email,
            items,
            shipping_address: request.shipping_address,
            notes: request.notes,
        })?;

        self.orders.create_order(&order).await?;
        info!("Order {} created with {} item(s), total {}", order.id, order.items.len(), order.total);

        self.publish(OrderEvent::OrderCreated {
            order_id: order.id,
            user_id: order.user_id.clone(),
            total: order.total,
            item_count: order.items.len(),
            timestamp: Utc::now().timestamp(),
        });
        Ok(order)
    }

    pub async fn list_orders(&self) -> CoreResult<Vec<Order>> {
        self.orders.list_orders().await
    }

    pub async fn list_user_orders(&self, user_id: &str) -> CoreResult<Vec<Order>> {
        self.orders.list_user_orders(user_id).await
    }

    pub async fn get_order(&self, id: Uuid) -> CoreResult<Order> {
        self.orders
            .get_order(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("order {}", id)))
    }

    pub async fn update_status(&self, id: Uuid, next: OrderStatus) -> CoreResult<Order> {
        let mut order = self.get_order(id).await?;
        let previous = order.update_status(next)?;

        if previous == next {
            return Ok(order);
        }

        self.orders.update_order_status(id, next).await?;
        info!("Order {} moved from {} to {}", id, previous, next);

        self.publish(OrderEvent::OrderStatusChanged {
            order_id: id,
            from: previous.to_string(),
            to: next.to_string(),
            timestamp: Utc::now().timestamp(),
        });
        Ok(order)
    }

    fn publish(&self, event: OrderEvent) {
        // No subscribers is the normal case outside the admin dashboard
        if self.events.send(event).is_err() {
            debug!("No order event subscribers");
        }
    }
}
