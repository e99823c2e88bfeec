use serde::{Deserialize, Serialize};

use crate::rule::PricingRule;

/// A panel configuration to be priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuery {
    pub brand: String,
    pub model: String,

    /// Raw speaker-type tag. Tags outside the known set price with
    /// multiplier 1 instead of failing.
    pub speaker_type: String,

    pub speaker_count: u32,
    pub tweeter_count: u32,
}

/// Constants used when no rule applies and for the speaker surcharge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Base price for vehicles without an active rule
    pub fallback_base_price: f64,

    /// Speakers covered by the base price
    pub included_speakers: u32,

    /// Flat surcharge per speaker beyond the included ones
    pub extra_speaker_fee: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            fallback_base_price: 100.0,
            included_speakers: 2,
            extra_speaker_fee: 25.0,
        }
    }
}

/// Panel pricing engine.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// Prices a configuration against the rule resolved for its vehicle.
    ///
    /// `price = base × typeMultiplier + extraSpeakers × fee + tweeters × tweeterUnit`,
    /// rounded half away from zero. Without a rule the base falls back to the
    /// configured price, the multiplier to 1 and the tweeter unit to 0.
    pub fn compute_price(&self, rule: Option<&PricingRule>, query: &PriceQuery) -> i64 {
        let base = rule.map_or(self.config.fallback_base_price, |r| r.base_price);
        let type_multiplier = rule
            .and_then(|r| r.multiplier_for(&query.speaker_type))
            .unwrap_or(1.0);
        let tweeter_unit = rule.map_or(0.0, |r| r.tweeter_unit_price);

        let extra_speakers = query.speaker_count.saturating_sub(self.config.included_speakers);

        let price = base * type_multiplier
            + f64::from(extra_speakers) * self.config.extra_speaker_fee
            + f64::from(query.tweeter_count) * tweeter_unit;

        price.round() as i64
    }
}
