//! pvp-server: Main binary for the match statistics service.
//!
//! This binary wires together all crates. Without a subcommand it opens the
//! record store, starts the import scheduler and serves the HTTP API.

use clap::{Parser, Subcommand};
use pvp_api::{create_router, AppState};
use pvp_ingestion::{ImportConfig, ImportCoordinator, ImportMode, Importer};
use pvp_stats::StatsEngine;
use pvp_store::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default port for the server.
const DEFAULT_PORT: u16 = 8000;

/// Default host for the server.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Default SQLite database file.
const DEFAULT_DATABASE_PATH: &str = "pvp_stats.db";

#[derive(Parser, Debug)]
#[command(name = "pvp-server", version, about = "Match statistics service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API and run scheduled imports (default)
    Serve,

    /// Run a single import and exit
    Import {
        /// Re-read every file not marked done, ignoring checkpoints
        #[arg(long)]
        full: bool,

        /// Import directory (overrides IMPORT_DIR)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Clear incremental checkpoints
    Reset {
        /// Only reset files whose name contains this pattern
        #[arg(long)]
        pattern: Option<String>,

        /// Import directory (overrides IMPORT_DIR)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pvp_server=info,pvp_api=info,pvp_ingestion=info,pvp_stats=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ImportConfig::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Import { full, dir } => {
            let mut config = config;
            if full {
                config = config.with_mode(ImportMode::Full);
            }
            if let Some(dir) = dir {
                config = config.with_import_dir(dir);
            }
            import(config).await
        }
        Command::Reset { pattern, dir } => {
            let dir = dir.unwrap_or(config.import_dir);
            let removed = pvp_ingestion::reset(&dir, pattern.as_deref());
            tracing::info!(
                "Cleared {} checkpoint entries in {}",
                removed,
                dir.display()
            );
            Ok(())
        }
    }
}

fn open_store() -> anyhow::Result<Arc<SqliteStore>> {
    let path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());
    tracing::info!("Opening record store at {}", path);
    Ok(Arc::new(SqliteStore::open(&path)?))
}

async fn import(config: ImportConfig) -> anyhow::Result<()> {
    let importer = Importer::new(open_store()?, config);
    let report = tokio::task::spawn_blocking(move || importer.run()).await??;
    tracing::info!(
        "Imported {} rows from {} files",
        report.rows_imported,
        report.files_processed
    );
    Ok(())
}

async fn serve(config: ImportConfig) -> anyhow::Result<()> {
    let host = std::env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let store = open_store()?;
    let interval = config.interval;
    let coordinator = ImportCoordinator::new(Importer::new(store.clone(), config));
    let schedule = coordinator.start(interval);

    // Create app state
    let state = Arc::new(AppState::new(StatsEngine::new(store), coordinator));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /api/health            - Health check");
    tracing::info!("  GET  /api/stats/winrate     - Win-rate statistics");
    tracing::info!("  GET  /api/stats/duration    - Duration statistics");
    tracing::info!("  GET  /api/export/csv        - CSV export");
    tracing::info!("  POST /api/admin/import_once - Run one import");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    schedule.stop().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
