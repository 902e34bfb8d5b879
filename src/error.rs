//! # Provisioning Error Types
//!
//! Unified error handling for the provisioning library and the `batch-provision` CLI.

use std::path::PathBuf;
use thiserror::Error;

use crate::driver::ProvisionStage;

/// Provisioning operation result type
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Every way a provisioning run can fail
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{0}")]
    Usage(String),

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Failed to parse config file {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },

    #[error("Missing key(s) in config file: {}", keys.join(", "))]
    MissingConfigKeys { keys: Vec<String> },

    #[error("Cannot find subscription: {name}")]
    SubscriptionNotFound { name: String },

    #[error("No ACR credentials found")]
    NoRegistryCredentials,

    #[error("Cannot obtain batch endpoint: rg={resource_group} subid={subscription_id}")]
    BatchEndpointNotFound {
        resource_group: String,
        subscription_id: String,
    },

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Long-running operation for {resource} ended in state {state}")]
    LongRunningOperationFailed { resource: String, state: String },

    #[error("Invalid response: {field} - {reason}")]
    InvalidResponse { field: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{stage} failed")]
    Stage {
        stage: ProvisionStage,
        #[source]
        source: Box<ProvisionError>,
    },
}

impl ProvisionError {
    /// Create an API error from an HTTP response
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a credential error
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential(message.into())
    }

    /// Create a configuration error for client settings
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an invalid response error for a payload missing a required field
    pub fn invalid_response(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attach the driver stage that produced this error
    pub fn at_stage(self, stage: ProvisionStage) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost error, with any stage wrappers removed
    #[must_use]
    pub fn root(&self) -> &ProvisionError {
        match self {
            ProvisionError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// The stage that failed, if the error went through the driver
    #[must_use]
    pub fn stage(&self) -> Option<ProvisionStage> {
        match self {
            ProvisionError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// True for errors caused by local input rather than by the cloud
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self.root(),
            ProvisionError::Usage(_)
                | ProvisionError::ConfigFileNotFound { .. }
                | ProvisionError::ConfigParse { .. }
                | ProvisionError::MissingConfigKeys { .. }
                | ProvisionError::NoRegistryCredentials
                | ProvisionError::Configuration(_)
        )
    }
}
