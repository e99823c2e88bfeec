use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::speaker::SpeakerType;

/// Per-vehicle pricing record. At most one active rule exists per
/// (brand, model); inactive rules are kept as history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRule {
    pub id: Uuid,
    pub vehicle_brand: String,
    pub vehicle_model: String,
    pub base_price: f64,
    pub speaker_type_multipliers: BTreeMap<SpeakerType, f64>,
    pub tweeter_unit_price: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin input for a new rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPricingRule {
    pub vehicle_brand: String,
    pub vehicle_model: String,
    pub base_price: f64,
    #[serde(default)]
    pub speaker_type_multipliers: BTreeMap<SpeakerType, f64>,
    #[serde(default)]
    pub tweeter_unit_price: f64,
}

/// Partial update. Multipliers are merged per speaker type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePatch {
    pub vehicle_brand: Option<String>,
    pub vehicle_model: Option<String>,
    pub base_price: Option<f64>,
    pub speaker_type_multipliers: Option<BTreeMap<SpeakerType, f64>>,
    pub tweeter_unit_price: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("Vehicle brand is required")]
    MissingBrand,

    #[error("Vehicle model is required")]
    MissingModel,

    #[error("Base price must be a non-negative amount, got {0}")]
    InvalidBasePrice(f64),

    #[error("Multiplier for {speaker_type} must be positive, got {value}")]
    InvalidMultiplier {
        speaker_type: SpeakerType,
        value: f64,
    },

    #[error("Tweeter unit price must be a non-negative amount, got {0}")]
    InvalidTweeterPrice(f64),
}

impl PricingRule {
    /// Builds an active rule from admin input. Brand and model are trimmed and
    /// speaker types left out get their default multiplier.
    pub fn create(new: NewPricingRule) -> Result<Self, RuleError> {
        let mut multipliers: BTreeMap<SpeakerType, f64> = SpeakerType::ALL
            .into_iter()
            .map(|t| (t, t.default_multiplier()))
            .collect();
        multipliers.extend(new.speaker_type_multipliers);

        let now = Utc::now();
        let rule = Self {
            id: Uuid::new_v4(),
            vehicle_brand: new.vehicle_brand.trim().to_string(),
            vehicle_model: new.vehicle_model.trim().to_string(),
            base_price: new.base_price,
            speaker_type_multipliers: multipliers,
            tweeter_unit_price: new.tweeter_unit_price,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        rule.validate()?;
        Ok(rule)
    }

    /// Applies a patch in place. The rule is left untouched when the patched
    /// result would be invalid.
    pub fn apply(&mut self, patch: RulePatch) -> Result<(), RuleError> {
        let mut next = self.clone();

        if let Some(brand) = patch.vehicle_brand {
            next.vehicle_brand = brand.trim().to_string();
        }
        if let Some(model) = patch.vehicle_model {
            next.vehicle_model = model.trim().to_string();
        }
        if let Some(base_price) = patch.base_price {
            next.base_price = base_price;
        }
        if let Some(multipliers) = patch.speaker_type_multipliers {
            next.speaker_type_multipliers.extend(multipliers);
        }
        if let Some(tweeter) = patch.tweeter_unit_price {
            next.tweeter_unit_price = tweeter;
        }
        if let Some(active) = patch.is_active {
            next.is_active = active;
        }

        next.validate()?;
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        if self.vehicle_brand.trim().is_empty() {
            return Err(RuleError::MissingBrand);
        }
        if self.vehicle_model.trim().is_empty() {
            return Err(RuleError::MissingModel);
        }
        if !self.base_price.is_finite() || self.base_price < 0.0 {
            return Err(RuleError::InvalidBasePrice(self.base_price));
        }
        for (speaker_type, value) in &self.speaker_type_multipliers {
            if !value.is_finite() || *value <= 0.0 {
                return Err(RuleError::InvalidMultiplier {
                    speaker_type: *speaker_type,
                    value: *value,
                });
            }
        }
        if !self.tweeter_unit_price.is_finite() || self.tweeter_unit_price < 0.0 {
            return Err(RuleError::InvalidTweeterPrice(self.tweeter_unit_price));
        }
        Ok(())
    }

    /// Multiplier for a raw speaker-type tag; `None` for unknown tags or
    /// types missing from the rule.
    pub fn multiplier_for(&self, tag: &str) -> Option<f64> {
        let speaker_type = tag.parse::<SpeakerType>().ok()?;
        self.speaker_type_multipliers.get(&speaker_type).copied()
    }

    /// Exact, case-sensitive vehicle key match.
    pub fn matches(&self, brand: &str, model: &str) -> bool {
        self.vehicle_brand == brand && self.vehicle_model == model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golf() -> NewPricingRule {
        NewPricingRule {
            vehicle_brand: "Volkswagen".to_string(),
            vehicle_model: "Golf".to_string(),
            base_price: 120.0,
            speaker_type_multipliers: BTreeMap::from([(SpeakerType::FourOval, 1.2)]),
            tweeter_unit_price: 30.0,
        }
    }

    #[test]
    fn test_create_fills_default_multipliers() {
        let rule = PricingRule::create(golf()).unwrap();

        assert!(rule.is_active);
        assert_eq!(rule.speaker_type_multipliers[&SpeakerType::FourByTwenty], 1.0);
        assert_eq!(rule.speaker_type_multipliers[&SpeakerType::FourBySixteen], 0.95);
        // Explicit value wins over the default
        assert_eq!(rule.speaker_type_multipliers[&SpeakerType::FourOval], 1.2);
    }

    #[test]
    fn test_create_trims_vehicle_key() {
        let mut input = golf();
        input.vehicle_brand = "  Volkswagen ".to_string();
        let rule = PricingRule::create(input).unwrap();

        assert!(rule.matches("Volkswagen", "Golf"));
        assert!(!rule.matches("volkswagen", "Golf"));
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let mut input = golf();
        input.vehicle_model = "   ".to_string();
        assert_eq!(PricingRule::create(input).unwrap_err(), RuleError::MissingModel);

        let mut input = golf();
        input.base_price = -1.0;
        assert_eq!(PricingRule::create(input).unwrap_err(), RuleError::InvalidBasePrice(-1.0));

        let mut input = golf();
        input.speaker_type_multipliers.insert(SpeakerType::FourBySixteen, 0.0);
        assert!(matches!(
            PricingRule::create(input),
            Err(RuleError::InvalidMultiplier { speaker_type: SpeakerType::FourBySixteen, .. })
        ));

        let mut input = golf();
        input.tweeter_unit_price = f64::NAN;
        assert!(matches!(PricingRule::create(input), Err(RuleError::InvalidTweeterPrice(_))));
    }

    #[test]
    fn test_zero_base_price_is_allowed() {
        let mut input = golf();
        input.base_price = 0.0;
        assert!(PricingRule::create(input).is_ok());
    }

    #[test]
    fn test_apply_patch_merges_multipliers() {
        let mut rule = PricingRule::create(golf()).unwrap();
        let patch = RulePatch {
            base_price: Some(130.0),
            speaker_type_multipliers: Some(BTreeMap::from([(SpeakerType::FourByTwenty, 1.05)])),
            ..Default::default()
        };

        rule.apply(patch).unwrap();

        assert_eq!(rule.base_price, 130.0);
        assert_eq!(rule.speaker_type_multipliers[&SpeakerType::FourByTwenty], 1.05);
        assert_eq!(rule.speaker_type_multipliers[&SpeakerType::FourOval], 1.2);
    }

    #[test]
    fn test_invalid_patch_leaves_rule_untouched() {
        let mut rule = PricingRule::create(golf()).unwrap();
        let before = rule.clone();

        let patch = RulePatch {
            base_price: Some(200.0),
            tweeter_unit_price: Some(-5.0),
            ..Default::default()
        };

        assert!(rule.apply(patch).is_err());
        assert_eq!(rule, before);
    }

    #[test]
    fn test_multiplier_for_unknown_tag() {
        let rule = PricingRule::create(golf()).unwrap();
        assert_eq!(rule.multiplier_for("4x16"), Some(0.95));
        assert_eq!(rule.multiplier_for("6x9"), None);
    }

    #[test]
    fn test_rule_json_shape() {
        let rule = PricingRule::create(golf()).unwrap();
        let json = serde_json::to_value(&rule).unwrap();

        assert_eq!(json["vehicleBrand"], "Volkswagen");
        assert_eq!(json["speakerTypeMultipliers"]["4-oval"], 1.2);
        assert_eq!(json["tweeterUnitPrice"], 30.0);
        assert_eq!(json["isActive"], true);
    }
}
