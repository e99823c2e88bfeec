use async_trait::async_trait;
use pandizot_catalog::PricingRule;
use pandizot_order::{Order, OrderStatus};
use uuid::Uuid;

use crate::CoreResult;

/// Storage for pricing rules.
///
/// Implementations must reject, with `CoreError::Conflict`, any write that
/// would leave two active rules for the same (brand, model).
#[async_trait]
pub trait PricingRuleRepository: Send + Sync {
    /// The unique active rule for an exact, case-sensitive vehicle key.
    async fn find_active_rule(&self, brand: &str, model: &str) -> CoreResult<Option<PricingRule>>;

    async fn get_rule(&self, id: Uuid) -> CoreResult<Option<PricingRule>>;

    /// Sorted by brand, then model.
    async fn list_rules(&self, include_inactive: bool) -> CoreResult<Vec<PricingRule>>;

    async fn create_rule(&self, rule: &PricingRule) -> CoreResult<()>;

    /// Replaces the stored rule with the same id. `NotFound` if it is missing.
    async fn update_rule(&self, rule: &PricingRule) -> CoreResult<()>;

    /// Flips `is_active`. Returns the updated rule, `None` for unknown ids.
    async fn set_active(&self, id: Uuid, active: bool) -> CoreResult<Option<PricingRule>>;
}

/// Storage for customer orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: &Order) -> CoreResult<()>;

    async fn get_order(&self, id: Uuid) -> CoreResult<Option<Order>>;

    /// All orders, newest first.
    async fn list_orders(&self) -> CoreResult<Vec<Order>>;

    /// Orders placed by one user, newest first.
    async fn list_user_orders(&self, user_id: &str) -> CoreResult<Vec<Order>>;

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> CoreResult<()>;
}
