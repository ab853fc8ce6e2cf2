// Telemetry setup for the CLI
//
// The engine only emits tracing events; this module decides where they go.
// Logs are written to stderr so structured output on stdout stays parseable.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Configuration for log output
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Log filter (e.g., "info", "flowrun_engine=debug")
    pub log_filter: Option<String>,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl TelemetryConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `RUST_LOG` or `LOG_LEVEL`: Log filter (default: "info")
    /// - `LOG_FORMAT`: "json" for JSON lines, anything else for text
    pub fn from_env() -> Self {
        Self {
            log_filter: std::env::var("RUST_LOG")
                .ok()
                .or_else(|| std::env::var("LOG_LEVEL").ok()),
            json: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// Replace the filter unless one was set explicitly
    pub fn with_default_filter(mut self, filter: &str) -> Self {
        if self.log_filter.is_none() {
            self.log_filter = Some(filter.to_string());
        }
        self
    }
}

/// Install the global tracing subscriber
pub fn init_telemetry(config: TelemetryConfig) {
    let filter = config
        .log_filter
        .as_ref()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    let text_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    });
    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .init();

    tracing::debug!(json = config.json, "telemetry initialized");
}
