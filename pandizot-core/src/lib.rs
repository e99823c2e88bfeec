pub mod repository;
pub mod pricing;
pub mod orders;

pub use orders::{OrderService, PlaceOrder};
pub use pricing::PricingService;
pub use repository::{OrderRepository, PricingRuleRepository};

use pandizot_catalog::RuleError;
use pandizot_order::{OrderError, OrderStatus};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<RuleError> for CoreError {
    fn from(err: RuleError) -> Self {
        CoreError::ValidationError(err.to_string())
    }
}

impl From<OrderError> for CoreError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidTransition { from, to } => CoreError::InvalidTransition { from, to },
            other => CoreError::ValidationError(other.to_string()),
        }
    }
}
