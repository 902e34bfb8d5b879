//! # Client Settings
//!
//! Endpoints, API versions and timing for the Azure REST clients.
//! Defaults target the public Azure cloud; environment variables override them.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Settings shared by every REST client the tool builds
///
/// # Examples
///
/// ```rust
/// use batch_provision::config::ClientSettings;
///
/// let settings = ClientSettings::default();
/// assert_eq!(settings.arm_endpoint, "https://management.azure.com");
/// assert_eq!(settings.batch_scope, "https://batch.core.windows.net/.default");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Azure Resource Manager base URL
    pub arm_endpoint: String,
    /// Azure AD authority used by the service principal credential
    pub login_endpoint: String,
    /// DNS suffix of batch account data-plane endpoints
    pub batch_dns_suffix: String,
    /// Token scope for Resource Manager calls
    pub management_scope: String,
    /// Token scope for the batch data plane
    pub batch_scope: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Delay between polls of a long-running operation, in milliseconds
    pub poll_interval_ms: u64,
    pub api_versions: ApiVersions,
}

/// `api-version` query values per REST surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVersions {
    pub subscriptions: String,
    pub resources: String,
    pub batch_management: String,
    pub batch_service: String,
}

impl Default for ApiVersions {
    fn default() -> Self {
        Self {
            subscriptions: "2022-12-01".to_string(),
            resources: "2021-04-01".to_string(),
            batch_management: "2024-07-01".to_string(),
            batch_service: "2024-07-01.20.0".to_string(),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            arm_endpoint: "https://management.azure.com".to_string(),
            login_endpoint: "https://login.microsoftonline.com".to_string(),
            batch_dns_suffix: "batch.azure.com".to_string(),
            management_scope: "https://management.azure.com/.default".to_string(),
            batch_scope: "https://batch.core.windows.net/.default".to_string(),
            timeout_ms: 30000,
            poll_interval_ms: 5000,
            api_versions: ApiVersions::default(),
        }
    }
}

impl ClientSettings {
    /// Defaults with environment overrides applied
    pub fn load() -> Self {
        let mut settings = Self::default();
        settings.apply_overrides(|name| std::env::var(name).ok());
        debug!(settings = ?settings, "Loaded client settings");
        settings
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Apply `BATCH_PROVISION_*` overrides read through `lookup`
    ///
    /// Unparseable numeric values are ignored and the previous value kept.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("BATCH_PROVISION_ARM_ENDPOINT") {
            self.arm_endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(endpoint) = lookup("BATCH_PROVISION_LOGIN_ENDPOINT") {
            self.login_endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = lookup("BATCH_PROVISION_TIMEOUT_MS") {
            if let Ok(timeout_ms) = timeout.parse() {
                self.timeout_ms = timeout_ms;
            }
        }
        if let Some(interval) = lookup("BATCH_PROVISION_POLL_INTERVAL_MS") {
            if let Ok(poll_interval_ms) = interval.parse() {
                self.poll_interval_ms = poll_interval_ms;
            }
        }
    }
}
