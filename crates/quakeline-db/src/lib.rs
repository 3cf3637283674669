//! Database layer for the Quakeline product index.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. The product-index schema (events, summaries,
//! properties, associations) is created exclusively through versioned
//! migrations managed here.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: the correlation algorithm is a single logical
//!   writer with concurrent readers, which is exactly the access pattern WAL
//!   mode serves, and an embedded store keeps a hub self-contained.
//! - **`r2d2` connection pool**: bounded connection reuse without manual
//!   lifetime management.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, so the schema ships with the code that depends on it.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
