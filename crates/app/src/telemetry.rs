use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::{
    fmt::{self as tracing_fmt, time::UtcTime},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer, Registry,
};

use outdoorsy_util::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize tracing: {0}")]
    Tracing(#[from] TryInitError),
}

static TRACING_INIT: OnceLock<()> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Human-readable events while developing, one JSON object per line in production.
fn output_layer(environment: Environment) -> BoxedLayer {
    let layer = tracing_fmt::layer()
        .with_target(false)
        .with_timer(UtcTime::rfc_3339());

    match environment {
        Environment::Development | Environment::Test => layer.pretty().boxed(),
        Environment::Production => layer.json().boxed(),
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryError> {
    if TRACING_INIT.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(output_layer(config.environment))
        .with(env_filter)
        .try_init()?;

    TRACING_INIT.set(()).ok();
    tracing::info!(
        stage = "telemetry",
        env = config.environment.as_str(),
        "tracing initialized"
    );
    Ok(())
}
