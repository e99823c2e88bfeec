use std::sync::Arc;

use pandizot_catalog::PricingEngine;
use pandizot_core::{OrderRepository, OrderService, PricingRuleRepository, PricingService};
use tokio::sync::broadcast;

/// Capacity of the order event channel feeding admin SSE streams.
const ORDER_EVENT_CAPACITY: usize = 100;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub pricing: Arc<PricingService>,
    pub orders: Arc<OrderService>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        rules: Arc<dyn PricingRuleRepository>,
        orders: Arc<dyn OrderRepository>,
        engine: PricingEngine,
        auth: AuthConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(ORDER_EVENT_CAPACITY);
        let pricing = Arc::new(PricingService::new(rules, engine));
        let orders = Arc::new(OrderService::new(orders, pricing.clone(), events));

        Self { pricing, orders, auth }
    }
}
