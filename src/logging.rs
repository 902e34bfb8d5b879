//! # Structured Logging Module
//!
//! Environment-aware structured logging to stderr. Stdout is reserved for the
//! progress lines the CLI prints for the operator.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// `RUST_LOG` wins over the environment default when it is set.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter),
        );

        // A subscriber installed by an embedding application takes precedence
        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::debug!(environment = %environment, "Structured logging initialized");
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("BATCH_PROVISION_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log filter directive based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "warn,batch_provision=info".to_string(),
        "test" => "batch_provision=debug".to_string(),
        _ => "warn,batch_provision=debug".to_string(),
    }
}

/// Log structured data for a provisioning operation against a cloud resource
pub fn log_provision_operation(
    operation: &str,
    resource_kind: &str,
    resource_name: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        resource_kind = %resource_kind,
        resource_name = resource_name,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "PROVISION_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
