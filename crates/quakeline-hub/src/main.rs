//! Quakeline hub binary.
//!
//! Reads newline-delimited JSON products from stdin, resolves each through
//! the indexer, and writes the committed change feed as newline-delimited
//! GeoJSON to stdout. Shuts down on EOF, SIGTERM, or SIGINT.

mod config;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use quakeline_feeds::JsonLinesFeed;
use quakeline_indexer::Indexer;
use quakeline_modules::ModuleRegistry;
use quakeline_types::Product;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("QUAKELINE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Initialize database
    let pool = quakeline_db::create_pool(
        &config.database.path,
        quakeline_db::DbRuntimeSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            pool_max_size: config.database.pool_max_size,
        },
    )
    .expect("failed to create database pool, check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied =
            quakeline_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    // Build the indexer and attach the stdout feed
    let registry = ModuleRegistry::with_defaults(&config.indexer.aggregator_source);
    let indexer = Arc::new(Indexer::new(pool, registry));
    indexer.add_listener(Box::new(JsonLinesFeed::new(std::io::stdout())));

    tracing::info!(
        aggregator = %config.indexer.aggregator_source,
        db = %config.database.path,
        "quakeline hub ready, reading products from stdin"
    );

    tokio::select! {
        () = ingest(Arc::clone(&indexer)) => {
            tracing::info!("product stream ended");
        }
        () = shutdown_signal() => {}
    }

    tracing::info!("quakeline hub shut down");
}

/// Consumes stdin line by line until EOF, resolving each product in order.
///
/// Malformed lines and rejected products are logged and skipped; untrusted
/// contributors routinely send junk and one bad submission must not stall
/// the stream.
async fn ingest(indexer: Arc<Indexer>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(err) => {
                tracing::error!(error = %err, "failed to read product stream");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let product: Product = match serde_json::from_str(&line) {
            Ok(product) => product,
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed product line");
                continue;
            }
        };

        // Resolution is serialized anyway; run it off the reactor thread
        // and wait so products apply in arrival order.
        let worker = Arc::clone(&indexer);
        let outcome =
            tokio::task::spawn_blocking(move || worker.on_product(&product)).await;
        match outcome {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "product rejected");
            }
            Err(join_err) => {
                tracing::error!(error = %join_err, "indexing task failed");
            }
        }
    }
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
