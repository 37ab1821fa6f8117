//! Order resource: a purchase made at a shop.
//!
//! # Invariants
//! - `status` is one of [`OrderStatus`] and `place` one of [`OrderPlace`]
//!   for every created order.
//! - Updates may omit either; supplied values must still be members.

use crate::error::ResourceResult;
use crate::model::page::{parse_metadata_param, parse_unsigned_param};
use crate::model::{Entity, EntityValidationError, Metadata, QueryFilter};
use serde::{Deserialize, Serialize};

/// Payment progress of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Ordered,
    Paid,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [Self::Ordered, Self::Paid, Self::Delivered];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Paid => "paid",
            Self::Delivered => "delivered",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

/// Where the order is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPlace {
    InHouse,
    Delivery,
}

impl OrderPlace {
    pub const ALL: [OrderPlace; 2] = [Self::InHouse, Self::Delivery];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InHouse => "inhouse",
            Self::Delivery => "delivery",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|place| place.as_str() == value)
    }
}

/// Order made by a customer at a shop.
///
/// Every field is optional on the wire; absent fields decode to their empty
/// value. `id`, `created_at` and `updated_at` are server-assigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Id of the shop the order is made at.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vendor: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub price: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub place: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl Order {
    /// Creates an order draft with the fields required for creation.
    pub fn new(
        name: impl Into<String>,
        price: u64,
        place: OrderPlace,
        status: OrderStatus,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            place: place.as_str().to_string(),
            status: status.as_str().to_string(),
            ..Self::default()
        }
    }
}

/// Validates a status value against [`OrderStatus`].
pub fn validate_status(value: &str) -> Result<(), EntityValidationError> {
    OrderStatus::parse(value)
        .map(|_| ())
        .ok_or_else(|| EntityValidationError::InvalidStatus(value.to_string()))
}

/// Validates a place value against [`OrderPlace`].
pub fn validate_place(value: &str) -> Result<(), EntityValidationError> {
    OrderPlace::parse(value)
        .map(|_| ())
        .ok_or_else(|| EntityValidationError::InvalidPlace(value.to_string()))
}

impl Entity for Order {
    const KIND: &'static str = "order";
    const COLLECTION: &'static str = "orders";

    type Filter = OrderFilter;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn set_timestamps(&mut self, created_at: i64, updated_at: i64) {
        self.created_at = created_at;
        self.updated_at = updated_at;
    }

    fn validate(&self) -> Result<(), EntityValidationError> {
        validate_status(&self.status)?;
        validate_place(&self.place)
    }

    fn validate_changes(&self) -> Result<(), EntityValidationError> {
        if !self.status.is_empty() {
            validate_status(&self.status)?;
        }
        if !self.place.is_empty() {
            validate_place(&self.place)?;
        }
        Ok(())
    }

    fn sparse_changes(&self, updated_at: i64) -> Self {
        Self {
            id: self.id.clone(),
            vendor: self.vendor.clone(),
            name: self.name.clone(),
            price: self.price,
            place: self.place.clone(),
            status: self.status.clone(),
            metadata: self.metadata.clone(),
            created_at: 0,
            updated_at,
        }
    }

    fn log_fields(&self) -> String {
        format!("name={:?} price={}", self.name, self.price)
    }
}

/// List filters for orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderFilter {
    pub vendor: String,
    pub name: String,
    pub price: u64,
    pub place: String,
    pub status: String,
    /// Matches orders whose metadata contains these pairs.
    pub metadata: Metadata,
}

impl QueryFilter for OrderFilter {
    fn apply_param(&mut self, key: &str, value: &str) -> ResourceResult<()> {
        match key {
            "vendor" => self.vendor = value.to_string(),
            "name" => self.name = value.to_string(),
            "price" => self.price = parse_unsigned_param(key, value)?,
            "place" => self.place = value.to_string(),
            "status" => self.status = value.to_string(),
            "metadata" => self.metadata = parse_metadata_param(value)?,
            _ => {}
        }
        Ok(())
    }

    fn is_unfiltered(&self) -> bool {
        self.vendor.is_empty()
            && self.name.is_empty()
            && self.price == 0
            && self.place.is_empty()
            && self.status.is_empty()
            && self.metadata.is_empty()
    }
}
