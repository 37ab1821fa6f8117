//! Shop resource: the vendor orders are made at.
//!
//! # Invariants
//! - Email and phone number hooks exist but accept every value. Tightening
//!   them is a requirements change, not a bug fix.

use crate::error::ResourceResult;
use crate::model::page::parse_metadata_param;
use crate::model::{Entity, EntityValidationError, Metadata, QueryFilter};
use serde::{Deserialize, Serialize};

/// Shop where orders are made.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shop {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// Phone number.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub number: String,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Shop {
    pub fn new(name: impl Into<String>, email: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            number: number.into(),
            ..Self::default()
        }
    }
}

/// Email format hook. Accepts every value.
pub fn validate_email(_email: &str) -> bool {
    true
}

/// Phone number format hook. Accepts every value.
pub fn validate_number(_number: &str) -> bool {
    true
}

impl Entity for Shop {
    const KIND: &'static str = "shop";
    const COLLECTION: &'static str = "shops";

    type Filter = ShopFilter;

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
        if !validate_number(&self.number) {
            return Err(EntityValidationError::InvalidNumber(self.number.clone()));
        }
        if !validate_email(&self.email) {
            return Err(EntityValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }

    fn validate_changes(&self) -> Result<(), EntityValidationError> {
        self.validate()
    }

    fn sparse_changes(&self, updated_at: i64) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            number: self.number.clone(),
            metadata: self.metadata.clone(),
            created_at: 0,
            updated_at,
        }
    }

    fn log_fields(&self) -> String {
        format!("name={:?} email={:?}", self.name, self.email)
    }
}

/// List filters for shops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopFilter {
    pub name: String,
    pub email: String,
    pub number: String,
    pub metadata: Metadata,
}

impl QueryFilter for ShopFilter {
    fn apply_param(&mut self, key: &str, value: &str) -> ResourceResult<()> {
        match key {
            "name" => self.name = value.to_string(),
            "email" => self.email = value.to_string(),
            "number" => self.number = value.to_string(),
            "metadata" => self.metadata = parse_metadata_param(value)?,
            _ => {}
        }
        Ok(())
    }

    fn is_unfiltered(&self) -> bool {
        self.name.is_empty()
            && self.email.is_empty()
            && self.number.is_empty()
            && self.metadata.is_empty()
    }
}
