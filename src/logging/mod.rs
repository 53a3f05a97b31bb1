// Logging module for structured logging using the tracing crate

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::TestWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::error::{HarnessError, Result};

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `config.level`. Output is JSON when
/// `config.json` is set, human-readable otherwise.
///
/// # Errors
///
/// Fails when the filter directive is invalid or a global subscriber is
/// already installed.
///
/// ```
/// use containerservice_testing::config::LoggingConfig;
/// use containerservice_testing::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
/// tracing::info!("Harness ready");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<()> {
    install(config, BoxMakeWriter::new(std::io::stderr))
}

/// Subscriber for test binaries: output goes through the test harness's
/// capture, and a second call is a no-op
pub fn init_test_subscriber() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        json: false,
    };
    let _ = install(&config, BoxMakeWriter::new(TestWriter::new()));
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).map_err(|e| {
            HarnessError::Config(format!("Invalid log level '{}': {}", level, e))
        }),
    }
}

fn install(config: &LoggingConfig, writer: BoxMakeWriter) -> Result<()> {
    let filter = build_filter(&config.level)?;

    let (json_layer, text_layer) = if config.json {
        let layer = fmt::layer().with_writer(writer).with_target(true).json();
        (Some(layer), None)
    } else {
        let layer = fmt::layer().with_writer(writer).with_target(true);
        (None, Some(layer))
    };

    Registry::default()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| HarnessError::Config(format!("Failed to initialize logging: {}", e)))
}
