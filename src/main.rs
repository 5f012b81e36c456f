use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use lumicare::api::server::start_server;
use lumicare::api::types::ApiContext;
use lumicare::config;
use lumicare::db::open_database;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = config::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Open once at startup so migrations run before the first request
    open_database(&db_path)?;
    tracing::info!(path = %db_path.display(), "database ready");

    let ctx = ApiContext::new(db_path, config::token_secret());
    let addr = config::bind_addr().parse()?;
    let mut server = start_server(ctx, addr).await?;
    tracing::info!(addr = %server.addr(), "{} v{} listening", config::APP_NAME, config::APP_VERSION);

    tokio::signal::ctrl_c().await?;
    tracing::info!("interrupt received, shutting down");
    server.shutdown();

    Ok(())
}
