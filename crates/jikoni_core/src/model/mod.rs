//! Resource domain model shared by orders and shops.
//!
//! # Responsibility
//! - Define the entity capability set every resource type implements.
//! - Define pagination descriptors and result pages.
//!
//! # Invariants
//! - `id` is assigned once at creation and never reassigned.
//! - `created_at <= updated_at` for every persisted entity.
//! - Empty/zero fields mean "not supplied" on update.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub mod order;
pub mod page;
pub mod shop;

pub use page::{PageMetadata, QueryFilter, ResultPage, DEFAULT_LIMIT, MAX_LIMIT};

/// Free-form JSON attributes attached to an entity.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Structural validation failures for resource entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    InvalidStatus(String),
    InvalidPlace(String),
    InvalidEmail(String),
    InvalidNumber(String),
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidStatus(value) => write!(f, "invalid order status `{value}`"),
            Self::InvalidPlace(value) => write!(f, "invalid order place `{value}`"),
            Self::InvalidEmail(value) => write!(f, "invalid shop email `{value}`"),
            Self::InvalidNumber(value) => write!(f, "invalid shop phone number `{value}`"),
        }
    }
}

impl Error for EntityValidationError {}

/// Capability set a resource type provides to the generic service.
///
/// The storage half of the capability set lives in
/// [`crate::repo::Storable`].
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// Singular resource name (`order`), used in method labels and logs.
    const KIND: &'static str;
    /// Plural resource name (`orders`), used for list method labels.
    const COLLECTION: &'static str;

    /// Exact-match and containment filters accepted by list queries.
    type Filter: QueryFilter;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn created_at(&self) -> i64;

    fn updated_at(&self) -> i64;

    fn set_timestamps(&mut self, created_at: i64, updated_at: i64);

    /// Full validation applied before creation.
    fn validate(&self) -> Result<(), EntityValidationError>;

    /// Validation of the supplied (non-empty) fields of an update.
    fn validate_changes(&self) -> Result<(), EntityValidationError>;

    /// Rebuilds a sparse update carrying only the id, supplied fields and
    /// `updated_at`.
    fn sparse_changes(&self, updated_at: i64) -> Self;

    /// Key request fields for call logging. Never includes metadata.
    fn log_fields(&self) -> String;
}

/// Generates a new time-ordered entity id.
///
/// The hyphenated UUIDv7 text sorts lexicographically by creation time.
pub fn new_entity_id() -> String {
    Uuid::now_v7().to_string()
}

/// Current wall clock in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
