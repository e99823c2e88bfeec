pub mod speaker;
pub mod rule;
pub mod pricing;

pub use speaker::SpeakerType;
pub use rule::{NewPricingRule, PricingRule, RuleError, RulePatch};
pub use pricing::{PriceQuery, PricingConfig, PricingEngine};
