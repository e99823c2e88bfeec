pub mod app_config;
pub mod database;
pub mod memory;
pub mod pricing_rule_repo;
pub mod order_repo;
pub mod seed;

pub use database::DbClient;
pub use memory::InMemoryStore;
pub use order_repo::StoreOrderRepository;
pub use pricing_rule_repo::StorePricingRuleRepository;
