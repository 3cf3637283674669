//! Embedded schema migrations.
//!
//! The product-index schema ships inside the binary as SQL files pulled in
//! with `include_str!`. On startup every migration that is not yet recorded
//! in `_quakeline_migrations` is applied inside its own transaction, so a
//! failure leaves no half-applied schema behind.

use rusqlite::Connection;
use thiserror::Error;

/// One embedded schema step.
struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// Applied top to bottom; append, never reorder.
const MIGRATIONS: &[Migration] = &[Migration {
    name: "000_product_index",
    sql: include_str!("migrations/000_product_index.sql"),
}];

#[derive(Debug, Error)]
pub enum MigrationError {
    /// A statement inside a migration failed; nothing from that migration
    /// was kept.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        name: String,
        source: rusqlite::Error,
    },

    /// The tracking table could not be read.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),
}

/// Brings the database schema up to date, returning how many migrations ran.
///
/// Already-recorded migrations are skipped, so calling this on every startup
/// is safe.
///
/// # Errors
///
/// Returns [`MigrationError`] when a migration fails to execute or the
/// tracking table cannot be queried.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, MIGRATIONS)
}

fn run_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    // The tracking table itself is not a migration; it has to exist before
    // anything can be checked against it.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _quakeline_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| exec_failed("_quakeline_migrations_bootstrap", e))?;

    let mut applied = 0;
    for migration in migrations {
        if is_applied(conn, migration.name)? {
            tracing::debug!(migration = migration.name, "already applied, skipping");
            continue;
        }
        tracing::info!(migration = migration.name, "applying migration");
        apply_one(conn, migration)?;
        applied += 1;
    }
    Ok(applied)
}

fn is_applied(conn: &Connection, name: &str) -> Result<bool, MigrationError> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM _quakeline_migrations WHERE name = ?1",
        [name],
        |row| row.get(0),
    )
    .map_err(MigrationError::StateQuery)
}

/// Runs one migration and its tracking insert in a single transaction.
fn apply_one(conn: &Connection, migration: &Migration) -> Result<(), MigrationError> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| exec_failed(migration.name, e))?;
    tx.execute_batch(migration.sql)
        .map_err(|e| exec_failed(migration.name, e))?;
    tx.execute(
        "INSERT INTO _quakeline_migrations (name) VALUES (?1)",
        [migration.name],
    )
    .map_err(|e| exec_failed(migration.name, e))?;
    tx.commit().map_err(|e| exec_failed(migration.name, e))
}

fn exec_failed(name: &str, source: rusqlite::Error) -> MigrationError {
    MigrationError::ExecutionFailed {
        name: name.to_string(),
        source,
    }
}
