use std::sync::Arc;

use pandizot_catalog::{NewPricingRule, PriceQuery, PricingEngine, PricingRule, RulePatch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::repository::PricingRuleRepository;
use crate::{CoreError, CoreResult};

/// Rule management and price computation over a rule store.
pub struct PricingService {
    rules: Arc<dyn PricingRuleRepository>,
    engine: PricingEngine,
}

impl PricingService {
    pub fn new(rules: Arc<dyn PricingRuleRepository>, engine: PricingEngine) -> Self {
        Self { rules, engine }
    }

    /// Resolves the active rule for the query's vehicle and prices it.
    /// Lookup failures are surfaced as-is, never retried.
    pub async fn compute_price(&self, query: &PriceQuery) -> CoreResult<i64> {
        let rule = self
            .rules
            .find_active_rule(&query.brand, &query.model)
            .await
            .map_err(|e| {
                warn!("Pricing rule lookup failed for {}/{}: {}", query.brand, query.model, e);
                CoreError::StorageError(format!("rule lookup failed: {}", e))
            })?;

        let price = self.engine.compute_price(rule.as_ref(), query);
        debug!(
            brand = %query.brand,
            model = %query.model,
            speaker_type = %query.speaker_type,
            rule_found = rule.is_some(),
            price,
            "Computed panel price"
        );
        Ok(price)
    }

    pub async fn list_rules(&self, include_inactive: bool) -> CoreResult<Vec<PricingRule>> {
        self.rules.list_rules(include_inactive).await
    }

    pub async fn get_rule(&self, id: Uuid) -> CoreResult<PricingRule> {
        self.rules
            .get_rule(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("pricing rule {}", id)))
    }

    /// Creates an active rule. `Conflict` when the vehicle already has one.
    pub async fn create_rule(&self, new: NewPricingRule) -> CoreResult<PricingRule> {
        let rule = PricingRule::create(new)?;
        self.ensure_vehicle_free(&rule).await?;

        self.rules.create_rule(&rule).await?;
        info!("Pricing rule {} created for {}/{}", rule.id, rule.vehicle_brand, rule.vehicle_model);
        Ok(rule)
    }

    pub async fn update_rule(&self, id: Uuid, patch: RulePatch) -> CoreResult<PricingRule> {
        let mut rule = self.get_rule(id).await?;
        rule.apply(patch)?;

        if rule.is_active {
            self.ensure_vehicle_free(&rule).await?;
        }

        self.rules.update_rule(&rule).await?;
        info!("Pricing rule {} updated", rule.id);
        Ok(rule)
    }

    /// Soft delete: the rule stays stored but no longer prices anything.
    pub async fn deactivate_rule(&self, id: Uuid) -> CoreResult<PricingRule> {
        let rule = self
            .rules
            .set_active(id, false)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("pricing rule {}", id)))?;

        info!("Pricing rule {} deactivated", id);
        Ok(rule)
    }

    /// `Conflict` when another active rule took over the vehicle meanwhile.
    pub async fn reactivate_rule(&self, id: Uuid) -> CoreResult<PricingRule> {
        let rule = self.get_rule(id).await?;
        if rule.is_active {
            return Ok(rule);
        }
        self.ensure_vehicle_free(&rule).await?;

        let rule = self
            .rules
            .set_active(id, true)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("pricing rule {}", id)))?;

        info!("Pricing rule {} reactivated", id);
        Ok(rule)
    }

    async fn ensure_vehicle_free(&self, rule: &PricingRule) -> CoreResult<()> {
        match self
            .rules
            .find_active_rule(&rule.vehicle_brand, &rule.vehicle_model)
            .await?
        {
            Some(existing) if existing.id != rule.id => Err(CoreError::Conflict(format!(
                "an active pricing rule already exists for {}/{}",
                rule.vehicle_brand, rule.vehicle_model
            ))),
            _ => Ok(()),
        }
    }
}
