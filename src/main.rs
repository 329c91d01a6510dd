use clap::Parser;
use issue_tracker::api::{AppState, router};
use issue_tracker::cli::Cli;
use issue_tracker::config::{self, ServerConfig};
use issue_tracker::issues::IssueManager;
use issue_tracker::logging::init_logging;
use issue_tracker::storage::SqliteStorage;
use issue_tracker::{IssueTrackerError, Result};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let server = match resolve_config(&cli) {
        Ok(server) => server,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = init_logging(cli.verbose, cli.quiet, server.log_json) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = serve(&server).await {
        tracing::error!(error = %e, "Server stopped");
        exit_with(&e);
    }
}

fn resolve_config(cli: &Cli) -> Result<ServerConfig> {
    let layer = config::load_config(cli.config.as_deref(), &cli.overrides())?;
    ServerConfig::from_layer(&layer)
}

async fn serve(server: &ServerConfig) -> Result<()> {
    let storage = SqliteStorage::open_location(&server.database, Some(server.lock_timeout_ms))?;
    let state = AppState::new(IssueManager::new(storage));

    let listener = TcpListener::bind((server.host.as_str(), server.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, database = ?server.database, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn exit_with(err: &IssueTrackerError) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}
