//! Store bootstrap for file and in-memory SQLite databases.
//!
//! # Responsibility
//! - Build the connection pool and configure every pooled connection.
//! - Trigger schema migrations before returning a usable store.
//!
//! # Invariants
//! - Pooled connections have `foreign_keys=ON` and `json_contains`.
//! - In-memory stores hold exactly one connection so every call sees the
//!   same database.

use super::migrations::apply_migrations;
use super::{configure_connection, DbResult, Store};
use crate::config::StoreConfig;
use log::{error, info};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::time::{Duration, Instant};

/// Opens the store described by `config` and applies pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_store(config: &StoreConfig) -> DbResult<Store> {
    let started_at = Instant::now();
    let mode = if config.is_memory() { "memory" } else { "file" };
    info!("event=db_open module=db status=start mode={mode}");

    match build_store(config) {
        Ok(store) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={} max_connections={}",
                started_at.elapsed().as_millis(),
                store.pool.max_size()
            );
            Ok(store)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Opens a private in-memory store with default settings.
pub fn open_store_in_memory() -> DbResult<Store> {
    open_store(&StoreConfig::in_memory())
}

fn build_store(config: &StoreConfig) -> DbResult<Store> {
    config.validate()?;

    let is_memory = config.is_memory();
    let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
    let enable_wal = config.enable_wal && !is_memory;

    let manager = if is_memory {
        SqliteConnectionManager::memory()
    } else {
        SqliteConnectionManager::file(&config.path)
    }
    .with_init(move |conn| configure_connection(conn, busy_timeout, enable_wal));

    let max_size = if is_memory { 1 } else { config.max_connections };
    let connection_timeout = Duration::from_millis(config.connection_timeout_ms);
    let mut builder = Pool::builder()
        .max_size(max_size)
        .min_idle(Some(1))
        .connection_timeout(connection_timeout);
    if is_memory {
        // Recycling the only connection would drop the database with it.
        builder = builder.idle_timeout(None).max_lifetime(None);
    }
    let pool = builder.build(manager)?;

    {
        let mut conn = pool.get()?;
        apply_migrations(&mut conn)?;
    }

    Ok(Store {
        pool,
        connection_timeout,
        is_memory,
    })
}
