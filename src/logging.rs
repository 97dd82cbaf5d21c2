//! # Structured Logging Module
//!
//! Environment-aware structured logging that outputs to the console and,
//! when a log directory is configured, to per-process JSON log files.

use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;

use chrono::Utc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::config::LoggingConfig;
use crate::config::loader::detect_environment;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Initialize logging with environment-derived defaults
pub fn init_logging() {
    let environment = detect_environment();
    init_logging_with(&LoggingConfig::default(), &environment);
}

/// Initialize logging from configuration.
///
/// Safe to call more than once; only the first call installs a subscriber.
/// `RUST_LOG` overrides the configured level when set.
pub fn init_logging_with(config: &LoggingConfig, environment: &str) {
    let config = config.clone();
    let environment = environment.to_string();

    LOGGER_INITIALIZED.get_or_init(move || {
        let level = if config.level.is_empty() {
            default_log_level(&environment)
        } else {
            config.level.clone()
        };
        let env_filter = || {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.clone()))
        };

        let mut layers: Vec<BoxedLayer> = Vec::new();

        if config.format == "json" {
            layers.push(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(env_filter())
                    .boxed(),
            );
        } else {
            layers.push(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(true)
                    .with_filter(env_filter())
                    .boxed(),
            );
        }

        let mut log_path: Option<PathBuf> = None;
        if let Some(directory) = &config.directory {
            let log_dir = PathBuf::from(directory);
            match fs::create_dir_all(&log_dir) {
                Ok(()) => {
                    let filename = format!(
                        "{}.{}.{}.log",
                        environment,
                        process::id(),
                        Utc::now().format("%Y%m%d_%H%M%S")
                    );
                    let file_appender = tracing_appender::rolling::never(&log_dir, &filename);
                    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

                    layers.push(
                        fmt::layer()
                            .with_writer(file_writer)
                            .with_target(true)
                            .with_ansi(false)
                            .json()
                            .with_filter(env_filter())
                            .boxed(),
                    );

                    log_path = Some(log_dir.join(filename));
                    // Keep the background writer alive for the process lifetime
                    std::mem::forget(guard);
                }
                Err(e) => {
                    eprintln!(
                        "dispatch-core: cannot create log directory {}: {}",
                        log_dir.display(),
                        e
                    );
                }
            }
        }

        // Another subscriber may already be installed; that is fine
        if tracing_subscriber::registry().with(layers).try_init().is_ok() {
            tracing::info!(
                environment = %environment,
                level = %level,
                log_file = log_path.as_ref().map(|p| p.display().to_string()),
                "Structured logging initialized"
            );
        }
    });
}

/// Default level filter per environment when none is configured
fn default_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for delivery run operations
pub fn log_run_operation(
    operation: &str,
    run_id: Option<Uuid>,
    store_name: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        run_id = run_id.map(|id| id.to_string()),
        store_name = store_name,
        status = %status,
        details = details,
        "RUN_OPERATION"
    );
}

/// Log structured data for change feed activity
pub fn log_feed_event(channel: &str, table: &str, op: &str, row_id: Uuid) {
    tracing::debug!(
        channel = %channel,
        table = %table,
        op = %op,
        row_id = %row_id,
        "FEED_EVENT"
    );
}

/// Log structured data for database operations
pub fn log_database_operation(
    operation: &str,
    table: Option<&str>,
    record_id: Option<Uuid>,
    status: &str,
    duration_ms: Option<u64>,
) {
    tracing::info!(
        operation = %operation,
        table = table,
        record_id = record_id.map(|id| id.to_string()),
        status = %status,
        duration_ms = duration_ms,
        "DATABASE_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        "ERROR"
    );
}
