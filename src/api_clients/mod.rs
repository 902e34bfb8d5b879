//! # API Clients
//!
//! Three REST surfaces are used during a run, each behind a trait so the provisioning
//! steps can be exercised without a cloud:
//!
//! - [`SubscriptionApi`]: tenant-level subscription listing
//! - [`ManagementApi`]: subscription-scoped Resource Manager calls (accounts, resources, pools)
//! - [`BatchServiceApi`]: the batch account's data plane (jobs, tasks)

pub mod batch_client;
pub mod management_client;
pub mod models;
pub mod rest;

pub use batch_client::BatchServiceClient;
pub use management_client::{ManagementClient, SubscriptionClient};
pub use rest::AzureRestClient;

use async_trait::async_trait;

use crate::error::ProvisionResult;
use crate::subscription::SubscriptionInfo;
use models::{
    BatchAccount, BatchAccountCreateParameters, GenericResource, JobAddParameter, Pool,
    TaskAddParameter,
};

#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    /// Every subscription visible to the caller, across all pages
    async fn list_subscriptions(&self) -> ProvisionResult<Vec<SubscriptionInfo>>;
}

#[async_trait]
pub trait ManagementApi: Send + Sync {
    fn subscription_id(&self) -> &str;

    /// Start a create-or-update of a batch account
    ///
    /// Returns `None` when the service accepted the request without returning the
    /// resource; the caller polls [`ManagementApi::get_batch_account`] in either case
    /// until the provisioning state is terminal.
    async fn begin_create_batch_account(
        &self,
        resource_group: &str,
        account_name: &str,
        parameters: &BatchAccountCreateParameters,
    ) -> ProvisionResult<Option<BatchAccount>>;

    async fn get_batch_account(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> ProvisionResult<BatchAccount>;

    /// Every resource in the group, across all pages
    async fn list_resources(&self, resource_group: &str) -> ProvisionResult<Vec<GenericResource>>;

    /// Submit a pool creation; does not wait for nodes
    async fn create_pool(
        &self,
        resource_group: &str,
        account_name: &str,
        pool_name: &str,
        pool: &Pool,
    ) -> ProvisionResult<()>;
}

#[async_trait]
pub trait BatchServiceApi: Send + Sync {
    fn endpoint(&self) -> &str;

    async fn add_job(&self, job: &JobAddParameter) -> ProvisionResult<()>;

    async fn add_task(&self, job_id: &str, task: &TaskAddParameter) -> ProvisionResult<()>;
}
