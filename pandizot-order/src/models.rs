use chrono::{DateTime, Utc};
use pandizot_catalog::{PriceQuery, SpeakerType};
use pandizot_shared::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::OrderStatus;

/// What the customer configured for one line, before pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfiguration {
    pub vehicle_brand: String,
    pub vehicle_model: String,
    pub speaker_type: SpeakerType,
    pub speaker_count: u32,
    #[serde(default)]
    pub tweeter_count: u32,
    /// Free-text extras, e.g. material, color, stitching
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub preview_image_url: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl LineConfiguration {
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.vehicle_brand.trim().is_empty() || self.vehicle_model.trim().is_empty() {
            return Err(OrderError::InvalidItem("vehicle brand and model are required".into()));
        }
        if self.speaker_count < 1 {
            return Err(OrderError::InvalidItem("speaker count must be at least 1".into()));
        }
        if self.quantity < 1 {
            return Err(OrderError::InvalidItem("quantity must be at least 1".into()));
        }
        Ok(())
    }

    pub fn price_query(&self) -> PriceQuery {
        PriceQuery {
            brand: self.vehicle_brand.trim().to_string(),
            model: self.vehicle_model.trim().to_string(),
            speaker_type: self.speaker_type.as_str().to_string(),
            speaker_count: self.speaker_count,
            tweeter_count: self.tweeter_count,
        }
    }
}

/// A priced order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub vehicle_brand: String,
    pub vehicle_model: String,
    pub speaker_type: SpeakerType,
    pub speaker_count: u32,
    pub tweeter_count: u32,
    pub options: Vec<String>,
    pub unit_price: i64,
    pub quantity: u32,
    pub total_price: i64,
    pub preview_image_url: Option<String>,
}

impl OrderItem {
    /// Fails with `AmountOutOfRange` when the line total does not fit an `i64`.
    pub fn priced(line: LineConfiguration, unit_price: i64) -> Result<Self, OrderError> {
        let total_price = unit_price
            .checked_mul(i64::from(line.quantity))
            .ok_or(OrderError::AmountOutOfRange)?;

        Ok(Self {
            vehicle_brand: line.vehicle_brand.trim().to_string(),
            vehicle_model: line.vehicle_model.trim().to_string(),
            speaker_type: line.speaker_type,
            speaker_count: line.speaker_count,
            tweeter_count: line.tweeter_count,
            options: line.options,
            unit_price,
            quantity: line.quantity,
            total_price,
            preview_image_url: line.preview_image_url,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: Masked<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub district: Option<String>,
    pub postal_code: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
    /// Contact email for guest checkout
    pub email: Option<Masked<String>>,
}

fn default_country() -> String {
    "TR".to_string()
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), OrderError> {
        let required = [
            ("fullName", self.full_name.as_str()),
            ("phone", self.phone.expose().as_str()),
            ("addressLine1", self.address_line1.as_str()),
            ("city", self.city.as_str()),
            ("country", self.country.as_str()),
        ];

        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(OrderError::InvalidAddress(format!("{} is required", field))),
            None => Ok(()),
        }
    }
}

/// Input for a new order with already priced items.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<String>,
    pub email: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub notes: Option<String>,
}

/// A customer's order of one or more panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    /// `None` for guest checkout
    pub user_id: Option<String>,
    pub email: Masked<String>,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(input: NewOrder) -> Result<Self, OrderError> {
        if input.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        input.shipping_address.validate()?;

        let email = normalize_email(&input.email)?;
        let total = input
            .items
            .iter()
            .try_fold(0i64, |sum, item| sum.checked_add(item.total_price))
            .ok_or(OrderError::AmountOutOfRange)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            email: Masked::new(email),
            items: input.items,
            shipping_address: input.shipping_address,
            status: OrderStatus::Preparing,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
            total,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves the order to `next`, returning the previous status.
    pub fn update_status(&mut self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        let previous = self.status;
        if !previous.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { from: previous, to: next });
        }

        if previous != next {
            self.status = next;
            self.updated_at = Utc::now();
        }
        Ok(previous)
    }
}

fn normalize_email(raw: &str) -> Result<String, OrderError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(OrderError::MissingEmail);
    }

    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !well_formed {
        return Err(OrderError::InvalidEmail);
    }
    Ok(email)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Invalid order item: {0}")]
    InvalidItem(String),

    #[error("Invalid shipping address: {0}")]
    InvalidAddress(String),

    #[error("Order amount is too large")]
    AmountOutOfRange,

    #[error("Email is required")]
    MissingEmail,

    #[error("Email address is not valid")]
    InvalidEmail,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },
}
