//! Generic SQLite repository shared by every resource type.
//!
//! # Responsibility
//! - Run the five resource statements against a pooled connection.
//! - Bound every statement by the caller's [`CallContext`].
//!
//! # Invariants
//! - One pooled connection per call, returned before the call completes.
//! - The page and count queries of a list call run on the same connection
//!   with the same predicate set, without a transaction.

use crate::context::CallContext;
use crate::db::{InterruptGuard, Store};
use crate::error::{ErrorKind, Operation, ResourceError, ResourceResult};
use crate::model::{PageMetadata, ResultPage};
use crate::repo::classify::classify;
use crate::repo::query::{count_sql, delete_sql, insert_sql, select_by_id_sql, select_page_sql};
use crate::repo::{stored_unsigned, Predicates, ResourceRepository, Storable, StorageRow};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::marker::PhantomData;

/// SQLite-backed repository for resource `E`.
pub struct SqliteRepository<E> {
    store: Store,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SqliteRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for SqliteRepository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRepository")
            .field("store", &self.store)
            .finish()
    }
}

impl<E: Storable> SqliteRepository<E> {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn run<T>(
        &self,
        ctx: &CallContext,
        operation: Operation,
        work: impl FnOnce(&Connection) -> ResourceResult<T>,
    ) -> ResourceResult<T> {
        let conn = self.store.acquire(ctx, operation)?;
        let _interrupt = InterruptGuard::arm(&*conn, ctx);
        work(&*conn)
    }
}

fn columns<E: Storable>() -> &'static [&'static str] {
    <E::Row as StorageRow>::COLUMNS
}

impl<E: Storable> ResourceRepository<E> for SqliteRepository<E> {
    fn save(&self, ctx: &CallContext, entity: &E) -> ResourceResult<String> {
        let row = entity.to_row()?;
        let sql = insert_sql(E::TABLE, columns::<E>());

        self.run(ctx, Operation::Create, |conn| {
            conn.execute(&sql, params_from_iter(row.into_values()))
                .map_err(|err| classify(Operation::Create, err))?;
            Ok(entity.id().to_string())
        })
    }

    fn retrieve_by_id(&self, ctx: &CallContext, id: &str) -> ResourceResult<E> {
        let sql = select_by_id_sql(E::TABLE, columns::<E>());

        let row = self.run(ctx, Operation::View, |conn| {
            conn.query_row(&sql, [id], |row| <E::Row as StorageRow>::read(row))
                .map_err(|err| classify(Operation::View, err))
        })?;

        E::from_row(row)
    }

    fn retrieve_all(
        &self,
        ctx: &CallContext,
        page: &PageMetadata<E::Filter>,
    ) -> ResourceResult<ResultPage<E>> {
        let mut predicates = Predicates::new();
        E::filter_predicates(&page.filter, &mut predicates)?;

        let limit = i64::try_from(page.limit).map_err(|err| {
            ResourceError::with_source(ErrorKind::InvalidLimit, "limit exceeds storage range", err)
        })?;
        let offset = i64::try_from(page.offset).map_err(|err| {
            ResourceError::with_source(ErrorKind::InvalidOffset, "offset exceeds storage range", err)
        })?;

        let select = select_page_sql(E::TABLE, columns::<E>(), &predicates);
        let count = count_sql(E::TABLE, &predicates);
        let storage = |err: rusqlite::Error| classify(Operation::List, err);

        let (rows, total) = self.run(ctx, Operation::List, |conn| {
            let mut values = predicates.values();
            values.push(Value::Integer(limit));
            values.push(Value::Integer(offset));

            let mut stmt = conn.prepare(&select).map_err(storage)?;
            let rows = stmt
                .query_map(params_from_iter(values), |row| {
                    <E::Row as StorageRow>::read(row)
                })
                .map_err(storage)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage)?;

            let total: i64 = conn
                .query_row(&count, params_from_iter(predicates.values()), |row| {
                    row.get(0)
                })
                .map_err(storage)?;

            Ok((rows, total))
        })?;

        let items = rows
            .into_iter()
            .map(E::from_row)
            .collect::<ResourceResult<Vec<_>>>()?;

        Ok(ResultPage {
            total: stored_unsigned("total", total)?,
            offset: page.offset,
            limit: page.limit,
            items,
        })
    }

    fn update(&self, ctx: &CallContext, entity: &E) -> ResourceResult<()> {
        let assignments = entity.changes()?;
        let sql = assignments.update_sql(E::TABLE);
        let values = assignments.into_values(entity.updated_at(), entity.id());

        let changed = self.run(ctx, Operation::Update, |conn| {
            conn.execute(&sql, params_from_iter(values))
                .map_err(|err| classify(Operation::Update, err))
        })?;

        if changed == 0 {
            return Err(ResourceError::with_detail(
                ErrorKind::NotFound,
                format!("{} {}", E::KIND, entity.id()),
            ));
        }

        Ok(())
    }

    fn delete(&self, ctx: &CallContext, id: &str) -> ResourceResult<()> {
        let sql = delete_sql(E::TABLE);

        self.run(ctx, Operation::Remove, |conn| {
            conn.execute(&sql, [id])
                .map_err(|err| classify(Operation::Remove, err))?;
            Ok(())
        })
    }
}
