//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage half of the resource capability set.
//! - Isolate SQLite statements and row mapping from the service layer.
//! - Classify storage failures into [`crate::error::ErrorKind`].
//!
//! # Invariants
//! - Metadata is stored as a JSON object, `{}` when empty, never NULL.
//! - Decoding stored metadata either round-trips or fails with
//!   `MalformedEntity`; it is never defaulted.

use crate::context::CallContext;
use crate::error::{ErrorKind, ResourceError, ResourceResult};
use crate::model::{Entity, Metadata, PageMetadata, ResultPage};
use rusqlite::types::Value;
use std::sync::Arc;

pub mod classify;
pub mod order_repo;
pub mod query;
pub mod resource_repo;
pub mod shop_repo;

pub use query::{Assignments, Predicates};
pub use resource_repo::SqliteRepository;

/// Storage row for one resource table.
pub trait StorageRow: Sized {
    /// Table columns in insertion and projection order.
    const COLUMNS: &'static [&'static str];

    /// Bound values in [`Self::COLUMNS`] order.
    fn into_values(self) -> Vec<Value>;

    /// Reads a row projected with [`Self::COLUMNS`].
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;
}

/// Storage capability set of a resource type.
pub trait Storable: Entity {
    const TABLE: &'static str;

    type Row: StorageRow;

    fn to_row(&self) -> ResourceResult<Self::Row>;

    fn from_row(row: Self::Row) -> ResourceResult<Self>;

    /// Adds one predicate per supplied filter field.
    fn filter_predicates(filter: &Self::Filter, predicates: &mut Predicates) -> ResourceResult<()>;

    /// Column assignments for the supplied fields of a sparse update.
    fn changes(&self) -> ResourceResult<Assignments>;
}

/// Persistence contract the resource service depends on.
pub trait ResourceRepository<E: Entity>: Send + Sync {
    /// Inserts a fully stamped entity and returns its id.
    fn save(&self, ctx: &CallContext, entity: &E) -> ResourceResult<String>;

    /// Fails with `NotFound` when no row matches.
    fn retrieve_by_id(&self, ctx: &CallContext, id: &str) -> ResourceResult<E>;

    /// Filtered window ordered by `created_at` ascending, with the filtered
    /// total.
    fn retrieve_all(
        &self,
        ctx: &CallContext,
        page: &PageMetadata<E::Filter>,
    ) -> ResourceResult<ResultPage<E>>;

    /// Applies the supplied fields of a sparse entity.
    fn update(&self, ctx: &CallContext, entity: &E) -> ResourceResult<()>;

    /// Removes the row if present. Absent ids succeed.
    fn delete(&self, ctx: &CallContext, id: &str) -> ResourceResult<()>;
}

impl<E: Entity, R: ResourceRepository<E> + ?Sized> ResourceRepository<E> for Arc<R> {
    fn save(&self, ctx: &CallContext, entity: &E) -> ResourceResult<String> {
        (**self).save(ctx, entity)
    }

    fn retrieve_by_id(&self, ctx: &CallContext, id: &str) -> ResourceResult<E> {
        (**self).retrieve_by_id(ctx, id)
    }

    fn retrieve_all(
        &self,
        ctx: &CallContext,
        page: &PageMetadata<E::Filter>,
    ) -> ResourceResult<ResultPage<E>> {
        (**self).retrieve_all(ctx, page)
    }

    fn update(&self, ctx: &CallContext, entity: &E) -> ResourceResult<()> {
        (**self).update(ctx, entity)
    }

    fn delete(&self, ctx: &CallContext, id: &str) -> ResourceResult<()> {
        (**self).delete(ctx, id)
    }
}

/// Encodes metadata for the `metadata` column. Empty maps become `{}`.
pub fn marshal_metadata(metadata: &Metadata) -> ResourceResult<String> {
    serde_json::to_string(metadata).map_err(|err| {
        ResourceError::with_source(ErrorKind::MalformedEntity, "metadata cannot be encoded", err)
    })
}

/// Decodes the `metadata` column.
pub fn unmarshal_metadata(encoded: &str) -> ResourceResult<Metadata> {
    serde_json::from_str::<Metadata>(encoded).map_err(|err| {
        ResourceError::with_source(
            ErrorKind::MalformedEntity,
            "stored metadata is not a JSON object",
            err,
        )
    })
}

/// Converts a stored integer back to an unsigned attribute.
pub(crate) fn stored_unsigned(column: &str, value: i64) -> ResourceResult<u64> {
    u64::try_from(value).map_err(|err| {
        ResourceError::with_source(
            ErrorKind::MalformedEntity,
            format!("stored `{column}` value {value} is negative"),
            err,
        )
    })
}
