use std::sync::Arc;

use anyhow::Result;

use movie_catalog::cli::CliOptions;
use movie_catalog::config::Config;
use movie_catalog::graphql::{Movie, schema_sdl};
use movie_catalog::logging::init_tracing;
use movie_catalog::services::{
    DatabaseServiceConfig, EventBus, GraphqlServiceConfig, HttpServerConfig, ServicesManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = CliOptions::from_args()?;

    if cli.print_schema {
        println!("{}", schema_sdl());
        return Ok(());
    }

    let mut config = Config::from_env()?;
    cli.apply(&mut config);
    let config = Arc::new(config);

    init_tracing(config.log_format)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting movie catalog");

    let events = Arc::new(EventBus::<Movie>::new(config.event_bus_capacity));

    let services = ServicesManager::builder()
        .add_service(DatabaseServiceConfig {
            database_url: config.database_url.clone(),
            max_connections: config.database_max_connections,
            actors_seed_path: config.actors_seed_path.clone(),
        })
        .add_service(GraphqlServiceConfig {
            server_port: config.port,
            events,
        })
        .add_service(HttpServerConfig {
            config: config.clone(),
        })
        .start()
        .await
        .inspect_err(|e| {
            let error = format!("{:#}", e);
            tracing::error!(%error, "Startup failed");
        })?;

    shutdown_signal().await;

    services.stop_all().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
