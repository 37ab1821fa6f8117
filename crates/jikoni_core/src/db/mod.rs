//! SQLite store bootstrap, connection pool and schema migrations.
//!
//! # Responsibility
//! - Open the pooled SQLite store used by every resource repository.
//! - Configure each pooled connection (pragmas, SQL functions).
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No repository touches the store before migrations succeed.
//! - The pool is the only shared mutable resource; no caller keeps a
//!   connection across logical operations.

use crate::context::CallContext;
use crate::error::{Operation, ResourceError, ResourceResult};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod json;
pub mod migrations;
mod open;

pub type DbResult<T> = Result<T, DbError>;

/// Pooled connection handed to repositories for one logical operation.
pub type StoreConnection = PooledConnection<SqliteConnectionManager>;

/// SQLite statements between cancellation checks.
const PROGRESS_CHECK_STEPS: i32 = 1_000;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    Pool(r2d2::Error),
    Config(crate::config::ConfigError),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Pool(err) => write!(f, "connection pool error: {err}"),
            Self::Config(err) => write!(f, "invalid store configuration: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Pool(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<r2d2::Error> for DbError {
    fn from(value: r2d2::Error) -> Self {
        Self::Pool(value)
    }
}

impl From<crate::config::ConfigError> for DbError {
    fn from(value: crate::config::ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Pooled SQLite store shared by all repositories. Cloning shares the pool.
#[derive(Clone)]
pub struct Store {
    pool: Pool<SqliteConnectionManager>,
    connection_timeout: Duration,
    is_memory: bool,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("is_memory", &self.is_memory)
            .field("connection_timeout", &self.connection_timeout)
            .field("max_connections", &self.pool.max_size())
            .finish_non_exhaustive()
    }
}

impl Store {
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// Acquires a connection for one operation, bounded by the context.
    ///
    /// # Errors
    /// - `Cancelled` when the context is done before or while waiting.
    /// - The operation's generic failure when the pool timeout elapses first.
    pub fn acquire(&self, ctx: &CallContext, operation: Operation) -> ResourceResult<StoreConnection> {
        ctx.check()?;
        let timeout = ctx
            .remaining()
            .map_or(self.connection_timeout, |remaining| {
                remaining.min(self.connection_timeout)
            });
        self.pool.get_timeout(timeout).map_err(|err| match ctx.check() {
            Err(cancelled) => cancelled,
            Ok(()) => ResourceError::with_source(
                operation.failed_kind(),
                "storage connection unavailable",
                err,
            ),
        })
    }

    /// Acquires a connection outside any call, for maintenance work.
    pub fn connection(&self) -> DbResult<StoreConnection> {
        Ok(self.pool.get()?)
    }
}

/// Interrupts the statement running on `conn` once `ctx` is done.
///
/// The progress handler is removed when the guard drops, before the
/// connection returns to the pool.
pub struct InterruptGuard<'conn> {
    conn: &'conn Connection,
}

impl<'conn> InterruptGuard<'conn> {
    pub fn arm(conn: &'conn Connection, ctx: &CallContext) -> Self {
        let ctx = ctx.clone();
        conn.progress_handler(PROGRESS_CHECK_STEPS, Some(move || ctx.is_done()));
        Self { conn }
    }
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
    }
}

pub(crate) fn configure_connection(
    conn: &mut Connection,
    busy_timeout: Duration,
    enable_wal: bool,
) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    if enable_wal {
        conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
    }
    json::register_functions(conn)?;
    Ok(())
}

pub use open::{open_store, open_store_in_memory};
