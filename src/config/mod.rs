//! # Configuration
//!
//! Two kinds of configuration flow through a provisioning run:
//!
//! - [`ProvisionConfig`]: the user's JSON document naming the subscription, resource
//!   group, region and container image. Loaded once, validated, never mutated.
//! - [`ClientSettings`]: endpoints, API versions and timeouts for the Azure REST
//!   clients. Defaults with `BATCH_PROVISION_*` environment overrides.
//!
//! Values derived from the cloud (subscription id, tenant id) are carried by a
//! separate [`ResolvedConfig`] rather than written back into the loaded document.

pub mod client_settings;
pub mod loader;

pub use client_settings::ClientSettings;

use serde::{Deserialize, Serialize};

use crate::subscription::SubscriptionInfo;

/// Keys that must be present in every configuration document
pub const REQUIRED_KEYS: [&str; 6] = [
    "subscription",
    "rg",
    "region",
    "acrserver",
    "acrimage",
    "acrimage_tag",
];

/// Optional key naming the user-assigned identity used for registry pulls
pub const REGISTRY_IDENTITY_KEY: &str = "acruseridentity";

/// Validated contents of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Subscription display name, resolved to an id at run time
    pub subscription: String,
    /// Resource group that receives the batch account
    pub rg: String,
    /// Azure region, e.g. `eastus`
    pub region: String,
    /// Container registry login server, e.g. `myreg.azurecr.io`
    pub acrserver: String,
    pub acrimage: String,
    pub acrimage_tag: String,
    /// Resource id of a user-assigned managed identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acruseridentity: Option<String>,
}

impl ProvisionConfig {
    /// Fully qualified image reference, `<server>/<image>:<tag>`
    #[must_use]
    pub fn container_image(&self) -> String {
        format!("{}/{}:{}", self.acrserver, self.acrimage, self.acrimage_tag)
    }

    /// Name of the batch account provisioned for this resource group
    #[must_use]
    pub fn batch_account_name(&self) -> String {
        format!("{}ba", self.rg)
    }
}

/// Configuration plus everything resolved from the cloud before provisioning starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub config: ProvisionConfig,
    pub subscription_id: String,
    pub tenant_id: String,
    pub batch_account_name: String,
}

impl ResolvedConfig {
    pub fn new(config: ProvisionConfig, subscription: &SubscriptionInfo) -> Self {
        let batch_account_name = config.batch_account_name();
        Self {
            config,
            subscription_id: subscription.subscription_id.clone(),
            tenant_id: subscription.tenant_id.clone(),
            batch_account_name,
        }
    }

    pub fn resource_group(&self) -> &str {
        &self.config.rg
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    pub fn registry_identity(&self) -> Option<&str> {
        self.config.acruseridentity.as_deref()
    }

    pub fn container_image(&self) -> String {
        self.config.container_image()
    }
}

#[cfg(test)]
pub(crate) fn sample_config() -> ProvisionConfig {
    ProvisionConfig {
        subscription: "Sub1".to_string(),
        rg: "rg1".to_string(),
        region: "eastus".to_string(),
        acrserver: "myreg.azurecr.io".to_string(),
        acrimage: "app".to_string(),
        acrimage_tag: "v1".to_string(),
        acruseridentity: Some("/subscriptions/s/identity1".to_string()),
    }
}
