//! List query descriptors and result pages.

use crate::error::{ErrorKind, ResourceError, ResourceResult};
use crate::model::Metadata;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Page limit applied when the caller supplies none.
pub const DEFAULT_LIMIT: u64 = 100;
/// Largest accepted page limit.
pub const MAX_LIMIT: u64 = 100;

/// Resource-specific list filters.
///
/// Empty/zero fields are not filters.
pub trait QueryFilter: Clone + Debug + Default + Send + Sync + 'static {
    /// Applies one decoded query parameter. Unknown keys are ignored.
    fn apply_param(&mut self, key: &str, value: &str) -> ResourceResult<()>;

    /// Returns whether no filter field is set.
    fn is_unfiltered(&self) -> bool;
}

/// Filter and pagination descriptor for list queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata<F> {
    /// Echoed back by callers; the authoritative count is on [`ResultPage`].
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub filter: F,
}

impl<F: Default> Default for PageMetadata<F> {
    fn default() -> Self {
        Self {
            total: 0,
            offset: 0,
            limit: DEFAULT_LIMIT,
            filter: F::default(),
        }
    }
}

impl<F: Default> PageMetadata<F> {
    pub fn window(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
            ..Self::default()
        }
    }
}

impl<F> PageMetadata<F> {
    pub fn with_filter(mut self, filter: F) -> Self {
        self.filter = filter;
        self
    }
}

/// One window of entities ordered by `created_at` ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage<E> {
    /// Rows matching the filter, independent of the window.
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub items: Vec<E>,
}

/// Parses an unsigned query parameter.
pub fn parse_unsigned_param(key: &str, value: &str) -> ResourceResult<u64> {
    value.trim().parse::<u64>().map_err(|err| {
        ResourceError::with_source(
            ErrorKind::MalformedEntity,
            format!("query parameter `{key}` must be an unsigned integer"),
            err,
        )
    })
}

/// Parses the `metadata` query parameter, a JSON object.
pub fn parse_metadata_param(value: &str) -> ResourceResult<Metadata> {
    serde_json::from_str::<Metadata>(value).map_err(|err| {
        ResourceError::with_source(
            ErrorKind::MalformedEntity,
            "query parameter `metadata` must be a JSON object",
            err,
        )
    })
}
