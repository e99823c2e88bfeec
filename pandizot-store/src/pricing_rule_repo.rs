use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pandizot_catalog::{PricingRule, SpeakerType};
use pandizot_core::{CoreError, CoreResult, PricingRuleRepository};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::database::storage_error;

pub struct StorePricingRuleRepository {
    pool: PgPool,
}

impl StorePricingRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PricingRuleRow {
    id: Uuid,
    vehicle_brand: String,
    vehicle_model: String,
    base_price: f64,
    speaker_type_multipliers: Json<BTreeMap<SpeakerType, f64>>,
    tweeter_unit_price: f64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PricingRuleRow> for PricingRule {
    fn from(row: PricingRuleRow) -> Self {
        Self {
            id: row.id,
            vehicle_brand: row.vehicle_brand,
            vehicle_model: row.vehicle_model,
            base_price: row.base_price,
            speaker_type_multipliers: row.speaker_type_multipliers.0,
            tweeter_unit_price: row.tweeter_unit_price,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_RULE: &str = "SELECT id, vehicle_brand, vehicle_model, base_price, speaker_type_multipliers, \
     tweeter_unit_price, is_active, created_at, updated_at FROM pricing_rules";

#[async_trait]
impl PricingRuleRepository for StorePricingRuleRepository {
    async fn find_active_rule(&self, brand: &str, model: &str) -> CoreResult<Option<PricingRule>> {
        let row = sqlx::query_as::<_, PricingRuleRow>(&format!(
            "{} WHERE vehicle_brand = $1 AND vehicle_model = $2 AND is_active",
            SELECT_RULE
        ))
        .bind(brand)
        .bind(model)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(PricingRule::from))
    }

    async fn get_rule(&self, id: Uuid) -> CoreResult<Option<PricingRule>> {
        let row = sqlx::query_as::<_, PricingRuleRow>(&format!("{} WHERE id = $1", SELECT_RULE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(row.map(PricingRule::from))
    }

    async fn list_rules(&self, include_inactive: bool) -> CoreResult<Vec<PricingRule>> {
        let rows = sqlx::query_as::<_, PricingRuleRow>(&format!(
            "{} WHERE is_active OR $1 ORDER BY vehicle_brand, vehicle_model, created_at",
            SELECT_RULE
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(PricingRule::from).collect())
    }

    async fn create_rule(&self, rule: &PricingRule) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pricing_rules (id, vehicle_brand, vehicle_model, base_price, speaker_type_multipliers, tweeter_unit_price, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(rule.id)
        .bind(&rule.vehicle_brand)
        .bind(&rule.vehicle_model)
        .bind(rule.base_price)
        .bind(Json(&rule.speaker_type_multipliers))
        .bind(rule.tweeter_unit_price)
        .bind(rule.is_active)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn update_rule(&self, rule: &PricingRule) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE pricing_rules
            SET vehicle_brand = $1, vehicle_model = $2, base_price = $3, speaker_type_multipliers = $4,
                tweeter_unit_price = $5, is_active = $6, updated_at = $7
            WHERE id = $8
            "#,
        )
        .bind(&rule.vehicle_brand)
        .bind(&rule.vehicle_model)
        .bind(rule.base_price)
        .bind(Json(&rule.speaker_type_multipliers))
        .bind(rule.tweeter_unit_price)
        .bind(rule.is_active)
        .bind(rule.updated_at)
        .bind(rule.id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("pricing rule {}", rule.id)));
        }
        Ok(())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> CoreResult<Option<PricingRule>> {
        let row = sqlx::query_as::<_, PricingRuleRow>(
            r#"
            UPDATE pricing_rules SET is_active = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, vehicle_brand, vehicle_model, base_price, speaker_type_multipliers,
                      tweeter_unit_price, is_active, created_at, updated_at
            "#,
        )
        .bind(active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(PricingRule::from))
    }
}
