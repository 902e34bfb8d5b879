//! # Resource Manager Clients
//!
//! Subscription listing and subscription-scoped management calls against
//! `https://management.azure.com`. Constructing a client performs no network I/O.

use async_trait::async_trait;
use tracing::info;

use super::models::{
    BatchAccount, BatchAccountCreateParameters, GenericResource, Pool,
};
use super::rest::{AzureRestClient, PutOutcome};
use super::{ManagementApi, SubscriptionApi};
use crate::config::ClientSettings;
use crate::error::ProvisionResult;
use crate::subscription::SubscriptionInfo;

/// Lists subscriptions visible to the credential (not bound to any subscription)
#[derive(Debug, Clone)]
pub struct SubscriptionClient {
    rest: AzureRestClient,
    settings: ClientSettings,
}

impl SubscriptionClient {
    pub fn new(rest: AzureRestClient, settings: ClientSettings) -> Self {
        Self { rest, settings }
    }
}

#[async_trait]
impl SubscriptionApi for SubscriptionClient {
    async fn list_subscriptions(&self) -> ProvisionResult<Vec<SubscriptionInfo>> {
        let url = AzureRestClient::url(
            &self.settings.arm_endpoint,
            "/subscriptions",
            &self.settings.api_versions.subscriptions,
        )?;
        self.rest.get_all_pages(url, "list subscriptions").await
    }
}

/// Management-plane client for one subscription
#[derive(Debug, Clone)]
pub struct ManagementClient {
    rest: AzureRestClient,
    settings: ClientSettings,
    subscription_id: String,
}

impl ManagementClient {
    pub fn new(rest: AzureRestClient, settings: ClientSettings, subscription_id: impl Into<String>) -> Self {
        Self {
            rest,
            settings,
            subscription_id: subscription_id.into(),
        }
    }

    fn resource_group_path(&self, resource_group: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, resource_group
        )
    }

    fn batch_account_path(&self, resource_group: &str, account_name: &str) -> String {
        format!(
            "{}/providers/Microsoft.Batch/batchAccounts/{}",
            self.resource_group_path(resource_group),
            account_name
        )
    }
}

#[async_trait]
impl ManagementApi for ManagementClient {
    fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    async fn begin_create_batch_account(
        &self,
        resource_group: &str,
        account_name: &str,
        parameters: &BatchAccountCreateParameters,
    ) -> ProvisionResult<Option<BatchAccount>> {
        let url = AzureRestClient::url(
            &self.settings.arm_endpoint,
            &self.batch_account_path(resource_group, account_name),
            &self.settings.api_versions.batch_management,
        )?;

        info!(
            resource_group = resource_group,
            account_name = account_name,
            location = %parameters.location,
            "Creating batch account"
        );

        match self
            .rest
            .put_json::<_, BatchAccount>(url, parameters, "create batch account")
            .await?
        {
            PutOutcome::Resource(account) => Ok(Some(account)),
            PutOutcome::Accepted => Ok(None),
        }
    }

    async fn get_batch_account(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> ProvisionResult<BatchAccount> {
        let url = AzureRestClient::url(
            &self.settings.arm_endpoint,
            &self.batch_account_path(resource_group, account_name),
            &self.settings.api_versions.batch_management,
        )?;
        self.rest.get_json(url, "get batch account").await
    }

    async fn list_resources(&self, resource_group: &str) -> ProvisionResult<Vec<GenericResource>> {
        let url = AzureRestClient::url(
            &self.settings.arm_endpoint,
            &format!("{}/resources", self.resource_group_path(resource_group)),
            &self.settings.api_versions.resources,
        )?;
        self.rest.get_all_pages(url, "list resources").await
    }

    async fn create_pool(
        &self,
        resource_group: &str,
        account_name: &str,
        pool_name: &str,
        pool: &Pool,
    ) -> ProvisionResult<()> {
        let url = AzureRestClient::url(
            &self.settings.arm_endpoint,
            &format!(
                "{}/pools/{}",
                self.batch_account_path(resource_group, account_name),
                pool_name
            ),
            &self.settings.api_versions.batch_management,
        )?;

        info!(account_name = account_name, pool_name = pool_name, "Creating pool");

        self.rest
            .put_json::<_, serde_json::Value>(url, pool, "create pool")
            .await
            .map(|_| ())
    }
}
