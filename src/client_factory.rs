//! # Client Factory
//!
//! Builds the clients a run needs. The management client is bound to a subscription
//! and does no I/O when built. The batch service client needs the account's data-plane
//! endpoint, which is discovered by listing the resources of the resource group.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api_clients::{
    AzureRestClient, BatchServiceApi, BatchServiceClient, ManagementApi, ManagementClient,
    SubscriptionApi, SubscriptionClient,
};
use crate::auth::TokenCredential;
use crate::config::ClientSettings;
use crate::error::{ProvisionError, ProvisionResult};

/// Data-plane URL of a batch account, `https://<account>.<location>.<suffix>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEndpoint(String);

impl BatchEndpoint {
    pub fn new(account_name: &str, location: &str, dns_suffix: &str) -> Self {
        Self(format!("https://{account_name}.{location}.{dns_suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the clients used by the driver
pub trait ClientFactory: Send + Sync {
    fn subscriptions(&self) -> ProvisionResult<Arc<dyn SubscriptionApi>>;

    fn management(&self, subscription_id: &str) -> ProvisionResult<Arc<dyn ManagementApi>>;

    fn batch_service(&self, endpoint: &BatchEndpoint) -> ProvisionResult<Arc<dyn BatchServiceApi>>;

    /// DNS suffix used when formatting discovered endpoints
    fn batch_dns_suffix(&self) -> &str {
        "batch.azure.com"
    }
}

/// Real Azure clients sharing one ambient credential
pub struct AzureClientFactory {
    credential: Arc<dyn TokenCredential>,
    settings: ClientSettings,
}

impl AzureClientFactory {
    pub fn new(credential: Arc<dyn TokenCredential>, settings: ClientSettings) -> Self {
        Self {
            credential,
            settings,
        }
    }

    fn management_rest(&self) -> ProvisionResult<AzureRestClient> {
        AzureRestClient::new(
            Arc::clone(&self.credential),
            self.settings.management_scope.clone(),
            &self.settings,
        )
    }
}

impl ClientFactory for AzureClientFactory {
    fn subscriptions(&self) -> ProvisionResult<Arc<dyn SubscriptionApi>> {
        Ok(Arc::new(SubscriptionClient::new(
            self.management_rest()?,
            self.settings.clone(),
        )))
    }

    fn management(&self, subscription_id: &str) -> ProvisionResult<Arc<dyn ManagementApi>> {
        Ok(Arc::new(ManagementClient::new(
            self.management_rest()?,
            self.settings.clone(),
            subscription_id,
        )))
    }

    fn batch_service(&self, endpoint: &BatchEndpoint) -> ProvisionResult<Arc<dyn BatchServiceApi>> {
        let rest = AzureRestClient::new(
            Arc::clone(&self.credential),
            self.settings.batch_scope.clone(),
            &self.settings,
        )?;
        info!(endpoint = %endpoint, "Created batch service client");
        Ok(Arc::new(BatchServiceClient::new(
            rest,
            endpoint.as_str(),
            self.settings.api_versions.batch_service.clone(),
        )))
    }

    fn batch_dns_suffix(&self) -> &str {
        &self.settings.batch_dns_suffix
    }
}

/// Find the data-plane endpoint of the batch account in `resource_group`
///
/// Assumes a single batch account per group; the first one listed wins. Fails with
/// [`ProvisionError::BatchEndpointNotFound`] if the group holds none.
pub async fn discover_batch_endpoint(
    management: &dyn ManagementApi,
    resource_group: &str,
    dns_suffix: &str,
) -> ProvisionResult<BatchEndpoint> {
    let resources = management.list_resources(resource_group).await?;
    debug!(
        resource_group = resource_group,
        resources = resources.len(),
        "Scanning resource group for a batch account"
    );

    resources
        .iter()
        .find(|resource| resource.is_batch_account())
        .map(|resource| BatchEndpoint::new(&resource.name, &resource.location, dns_suffix))
        .ok_or_else(|| ProvisionError::BatchEndpointNotFound {
            resource_group: resource_group.to_string(),
            subscription_id: management.subscription_id().to_string(),
        })
}

/// Discover the endpoint and build the batch service client for it
pub async fn build_batch_service_client<F>(
    factory: &F,
    management: &dyn ManagementApi,
    resource_group: &str,
) -> ProvisionResult<Arc<dyn BatchServiceApi>>
where
    F: ClientFactory + ?Sized,
{
    let endpoint =
        discover_batch_endpoint(management, resource_group, factory.batch_dns_suffix()).await?;
    factory.batch_service(&endpoint)
}
