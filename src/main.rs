use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use glyco_core::CoreConfig;
use glyco_core::config::{
    attempts_from_env_value, duration_ms_from_env_value, threshold_from_env_value,
};
use glyco_core::constants::{
    DEFAULT_MOCK_AUTH_DELAY_MS, DEFAULT_MOCK_PREDICT_DELAY_MS, DEFAULT_PREDICT_TIMEOUT_MS,
    DEFAULT_RETRY_BACKOFF_MS, DEFAULT_SESSION_FILE,
};
use glyco_core::retry::RetryPolicy;

/// Main entry point for the Glyco application
///
/// Serves the REST API backed by the mock auth, inference and model-registry collaborators.
/// The server holds no durable session of its own.
///
/// # Environment Variables
/// - `GLYCO_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `GLYCO_PREDICT_TIMEOUT_MS`: upper bound on one prediction round trip
/// - `GLYCO_MOCK_AUTH_DELAY_MS`, `GLYCO_MOCK_PREDICT_DELAY_MS`: artificial mock latency
/// - `GLYCO_DECISION_THRESHOLD`: probability above which the prediction is positive
/// - `GLYCO_READ_RETRIES`, `GLYCO_RETRY_BACKOFF_MS`: retry policy for idempotent reads
///
/// # Errors
/// Returns an error if:
/// - a configuration value cannot be parsed or is out of range,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("glyco=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config_from_env()?;
    let rest_addr = std::env::var("GLYCO_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting Glyco REST on {}", rest_addr);
    tracing::info!(
        "++ predict timeout {:?}, decision threshold {}",
        cfg.predict_timeout(),
        cfg.decision_threshold()
    );

    let state = AppState::mock(&cfg)?;
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Resolve `CoreConfig` from the process environment once at startup.
fn config_from_env() -> anyhow::Result<CoreConfig> {
    let var = |name: &str| std::env::var(name).ok();

    let mock_auth_delay = duration_ms_from_env_value(
        "GLYCO_MOCK_AUTH_DELAY_MS",
        var("GLYCO_MOCK_AUTH_DELAY_MS"),
        DEFAULT_MOCK_AUTH_DELAY_MS,
    )?;
    let mock_predict_delay = duration_ms_from_env_value(
        "GLYCO_MOCK_PREDICT_DELAY_MS",
        var("GLYCO_MOCK_PREDICT_DELAY_MS"),
        DEFAULT_MOCK_PREDICT_DELAY_MS,
    )?;
    let predict_timeout = duration_ms_from_env_value(
        "GLYCO_PREDICT_TIMEOUT_MS",
        var("GLYCO_PREDICT_TIMEOUT_MS"),
        DEFAULT_PREDICT_TIMEOUT_MS,
    )?;
    let threshold = threshold_from_env_value(var("GLYCO_DECISION_THRESHOLD"))?;
    let attempts = attempts_from_env_value(var("GLYCO_READ_RETRIES"))?;
    let backoff = duration_ms_from_env_value(
        "GLYCO_RETRY_BACKOFF_MS",
        var("GLYCO_RETRY_BACKOFF_MS"),
        DEFAULT_RETRY_BACKOFF_MS,
    )?;

    Ok(CoreConfig::new(
        PathBuf::from(DEFAULT_SESSION_FILE),
        mock_auth_delay,
        mock_predict_delay,
        predict_timeout,
        threshold,
        RetryPolicy::new(attempts, backoff),
    )?)
}
