use pandizot_catalog::{NewPricingRule, PricingRule, SpeakerType};
use pandizot_core::{CoreResult, PricingRuleRepository};
use std::collections::BTreeMap;
use tracing::info;

/// Demo rules for the two launch vehicles.
pub fn example_rules() -> Vec<NewPricingRule> {
    vec![
        NewPricingRule {
            vehicle_brand: "Volkswagen".to_string(),
            vehicle_model: "Golf".to_string(),
            base_price: 120.0,
            speaker_type_multipliers: BTreeMap::from([
                (SpeakerType::FourByTwenty, 1.0),
                (SpeakerType::FourBySixteen, 0.95),
                (SpeakerType::FourOval, 1.1),
            ]),
            tweeter_unit_price: 30.0,
        },
        NewPricingRule {
            vehicle_brand: "Toyota".to_string(),
            vehicle_model: "Corolla".to_string(),
            base_price: 110.0,
            speaker_type_multipliers: BTreeMap::from([
                (SpeakerType::FourByTwenty, 1.0),
                (SpeakerType::FourBySixteen, 0.93),
                (SpeakerType::FourOval, 1.08),
            ]),
            tweeter_unit_price: 25.0,
        },
    ]
}

/// Inserts the example rules when the store holds no rules at all.
/// Returns how many were inserted.
pub async fn seed_examples(rules: &dyn PricingRuleRepository) -> CoreResult<usize> {
    if !rules.list_rules(true).await?.is_empty() {
        return Ok(0);
    }

    let examples = example_rules();
    let count = examples.len();
    for new in examples {
        let rule = PricingRule::create(new)?;
        rules.create_rule(&rule).await?;
    }

    info!("Seeded {} example pricing rules", count);
    Ok(count)
}
