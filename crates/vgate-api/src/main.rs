//! Axum API server binary.

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vgate_api::{create_router, metrics, ApiConfig, AppState};
use vgate_job::check_program;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("vgate=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vgate-api");

    // Load configuration
    let mut config = ApiConfig::from_env();
    config
        .prepare_upload_dir()
        .await
        .with_context(|| format!("preparing upload dir {}", config.upload_dir.display()))?;
    info!(
        "API config: host={}, port={}, upload_dir={}, job={} {}",
        config.host,
        config.port,
        config.upload_dir.display(),
        config.job_program.display(),
        config.job_args.join(" ")
    );

    if let Err(e) = check_program(&config.job_program) {
        warn!("{}; uploads will fail until it is available", e);
    }
    match config.job_timeout {
        Some(timeout) => info!("Job timeout: {:?}", timeout),
        None => info!("Job timeout: none"),
    }

    let state = AppState::new(config.clone());

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("installing Prometheus recorder")?)
    } else {
        None
    };

    let app = create_router(state.clone(), metrics_handle);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, cancelling running jobs");
    state.cancel_jobs();
}
