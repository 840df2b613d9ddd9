//! review-roster server binary.

use clap::Parser;
use review_roster::config::Config;
use review_roster::services::ReviewService;
use review_roster::{db, http};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    env_logger::Builder::new().parse_filters(&config.log).init();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), String> {
    let db_path = db::get_db_path(&config.db);
    log::info!("Opening database at {}", db_path.display());

    let pool = db::initialize(&db_path)
        .await
        .map_err(|e| format!("Failed to initialize database: {}", e))?;

    let service = ReviewService::new(pool.clone(), config.service_settings());

    let (listener, _) = http::bind(config.addr).await?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Shutdown signal received");
                shutdown.cancel();
            }
            Err(e) => log::error!("Failed to listen for shutdown signal: {}", e),
        }
    });

    http::serve(listener, service, cancel).await?;

    pool.close().await;
    Ok(())
}
