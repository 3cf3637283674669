//! SQLite connection pooling.
//!
//! The correlation engine serializes its writes behind its own lock, so the
//! pool's job is to serve that one writer plus read-side consumers (feeds,
//! archival sweeps) without connection churn. WAL journaling lets those
//! readers proceed while a resolution is being committed.
//!
//! A `:memory:` path gives every pooled connection its own private
//! database. Anything that needs shared state across connections must use a
//! file-backed database; tests here use a temp directory.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Pool tunables, surfaced through hub configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a connection waits on a locked database before failing, in
    /// milliseconds.
    pub busy_timeout_ms: u64,

    /// Upper bound on pooled connections. One writer and a handful of
    /// readers is plenty for a hub.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum PoolError {
    /// Failed to build the connection pool.
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Opens the index database, creating it if necessary, and builds the pool.
///
/// Every connection is initialized with WAL journaling, foreign key
/// enforcement (the summary tables cascade from their event row), and the
/// configured busy timeout. WAL is verified rather than assumed: a
/// filesystem that refuses it would otherwise silently serialize readers
/// behind the writer.
///
/// # Errors
///
/// Returns `PoolError::PoolInit` when the pool cannot be built or its first
/// connection fails initialization.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(flags)
        .with_init(move |conn| init_connection(conn, settings.busy_timeout_ms));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    Ok(pool)
}

fn init_connection(conn: &mut Connection, busy_timeout_ms: u64) -> Result<(), rusqlite::Error> {
    let journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    // In-memory databases report "memory"; any other answer means WAL was
    // refused.
    if journal_mode != "wal" && journal_mode != "memory" {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!(
                "journal_mode WAL refused, database reports {journal_mode}"
            )),
        ));
    }
    conn.execute_batch(&format!(
        "PRAGMA foreign_keys = ON;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = {busy_timeout_ms};"
    ))
}
