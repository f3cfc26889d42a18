//! Printability server - HTTP front end for the bioink printability model
//!
//! Loads a trained model artifact once at startup and serves predictions,
//! parameter ranges, health and Prometheus metrics.

use anyhow::{Context, Result};
use printability_lib::{
    ParameterRangeRegistry, PredictionService, Predictor, PredictorMetrics, RemarkEngine,
    StructuredLogger,
};
use printability_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting printability-server");

    let config = ServerConfig::load()?;
    info!(
        node_name = %config.node_name,
        model_dir = %config.model_dir.display(),
        "Server configured"
    );

    let logger = StructuredLogger::new(&config.node_name);

    // A missing or corrupt model is fatal: there is nothing to serve
    let service = PredictionService::load(&config.model_dir)
        .with_context(|| {
            format!(
                "Failed to load model from {}; run `bioprint train` first",
                config.model_dir.display()
            )
        })?
        .with_remark_engine(RemarkEngine::with_config(config.remarks.clone()));
    let service: Arc<dyn Predictor> = Arc::new(service);

    let info = service.model_info();
    logger.log_model_loaded(
        &config.model_dir.display().to_string(),
        &info.model_version,
        info.trees,
    );

    let metrics = PredictorMetrics::new();
    metrics.set_model_info(&info.model_version, info.trees, info.training_samples);

    logger.log_startup(SERVER_VERSION, &info.model_version);

    let app_state = Arc::new(api::AppState::new(
        service,
        ParameterRangeRegistry::default(),
        metrics,
        logger.clone(),
    ));

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("API server exited"),
                Ok(Err(err)) => {
                    error!(error = %err, "API server failed");
                    return Err(err);
                }
                Err(err) => return Err(err).context("API server task panicked"),
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
