use async_trait::async_trait;
use chrono::Utc;
use pandizot_catalog::PricingRule;
use pandizot_core::{CoreError, CoreResult, OrderRepository, PricingRuleRepository};
use pandizot_order::{Order, OrderStatus};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local store for both collections. Used when no database is
/// configured and in tests. Contents are lost on exit.
#[derive(Default)]
pub struct InMemoryStore {
    rules: RwLock<HashMap<Uuid, PricingRule>>,
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn active_conflict(rules: &HashMap<Uuid, PricingRule>, candidate: &PricingRule) -> bool {
    candidate.is_active
        && rules.values().any(|r| {
            r.id != candidate.id
                && r.is_active
                && r.matches(&candidate.vehicle_brand, &candidate.vehicle_model)
        })
}

fn conflict(rule: &PricingRule) -> CoreError {
    CoreError::Conflict(format!(
        "an active pricing rule already exists for {}/{}",
        rule.vehicle_brand, rule.vehicle_model
    ))
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[async_trait]
impl PricingRuleRepository for InMemoryStore {
    async fn find_active_rule(&self, brand: &str, model: &str) -> CoreResult<Option<PricingRule>> {
        let rules = self.rules.read().await;
        Ok(rules
            .values()
            .find(|r| r.is_active && r.matches(brand, model))
            .cloned())
    }

    async fn get_rule(&self, id: Uuid) -> CoreResult<Option<PricingRule>> {
        Ok(self.rules.read().await.get(&id).cloned())
    }

    async fn list_rules(&self, include_inactive: bool) -> CoreResult<Vec<PricingRule>> {
        let rules = self.rules.read().await;
        let mut list: Vec<PricingRule> = rules
            .values()
            .filter(|r| include_inactive || r.is_active)
            .cloned()
            .collect();

        list.sort_by(|a, b| {
            (&a.vehicle_brand, &a.vehicle_model, a.created_at)
                .cmp(&(&b.vehicle_brand, &b.vehicle_model, b.created_at))
        });
        Ok(list)
    }

    async fn create_rule(&self, rule: &PricingRule) -> CoreResult<()> {
        let mut rules = self.rules.write().await;
        if rules.contains_key(&rule.id) {
            return Err(CoreError::Conflict(format!("pricing rule {} already exists", rule.id)));
        }
        if active_conflict(&rules, rule) {
            return Err(conflict(rule));
        }

        rules.insert(rule.id, rule.clone());
        Ok(())
    }

    async fn update_rule(&self, rule: &PricingRule) -> CoreResult<()> {
        let mut rules = self.rules.write().await;
        if !rules.contains_key(&rule.id) {
            return Err(CoreError::NotFound(format!("pricing rule {}", rule.id)));
        }
        if active_conflict(&rules, rule) {
            return Err(conflict(rule));
        }

        rules.insert(rule.id, rule.clone());
        Ok(())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> CoreResult<Option<PricingRule>> {
        let mut rules = self.rules.write().await;
        let Some(current) = rules.get(&id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        updated.is_active = active;
        updated.updated_at = Utc::now();

        if active_conflict(&rules, &updated) {
            return Err(conflict(&updated));
        }

        rules.insert(id, updated.clone());
        Ok(Some(updated))
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create_order(&self, order: &Order) -> CoreResult<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(CoreError::Conflict(format!("order {} already exists", order.id)));
        }

        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> CoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_orders(&self) -> CoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(newest_first(orders.values().cloned().collect()))
    }

    async fn list_user_orders(&self, user_id: &str) -> CoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(newest_first(
            orders
                .values()
                .filter(|o| o.user_id.as_deref() == Some(user_id))
                .cloned()
                .collect(),
        ))
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> CoreResult<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("order {}", id)))?;

        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }
}
