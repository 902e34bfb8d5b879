//! Recording fake of the Azure surfaces used by a provisioning run.
//!
//! Every API call is appended to a shared call log so tests can assert on what was
//! (and was not) requested. Batch accounts created through the fake show up in the
//! resource-group listing the same way they do on the real service.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use batch_provision::api_clients::models::{
    BatchAccount, BatchAccountCreateParameters, BatchAccountProperties, GenericResource,
    JobAddParameter, Pool, ProvisioningState, TaskAddParameter, BATCH_ACCOUNT_RESOURCE_TYPE,
};
use batch_provision::api_clients::{BatchServiceApi, ManagementApi, SubscriptionApi};
use batch_provision::client_factory::{BatchEndpoint, ClientFactory};
use batch_provision::config::ProvisionConfig;
use batch_provision::error::ProvisionResult;
use batch_provision::subscription::SubscriptionInfo;

pub const SUBSCRIPTION_ID: &str = "sub-123";
pub const TENANT_ID: &str = "tenant-456";
pub const IDENTITY: &str =
    "/subscriptions/sub-123/resourceGroups/rg1/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id1";

/// Calls observed by the fake, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListSubscriptions,
    CreateBatchAccount {
        resource_group: String,
        account_name: String,
        location: String,
    },
    GetBatchAccount {
        account_name: String,
    },
    ListResources {
        resource_group: String,
    },
    CreatePool {
        account_name: String,
        pool_name: String,
    },
    AddJob {
        endpoint: String,
        job_id: String,
    },
    AddTask {
        endpoint: String,
        job_id: String,
        task_id: String,
    },
}

#[derive(Debug, Default)]
pub struct FakeCloudState {
    pub calls: Vec<Call>,
    /// Resources per resource group, in listing order
    pub resources: HashMap<String, Vec<GenericResource>>,
    pub pools: Vec<Pool>,
    pub jobs: Vec<JobAddParameter>,
    pub tasks: Vec<TaskAddParameter>,
}

/// Fake cloud handing out clients that share one recorded state
#[derive(Clone)]
pub struct FakeCloud {
    subscriptions: Vec<SubscriptionInfo>,
    list_batch_accounts: bool,
    state: Arc<Mutex<FakeCloudState>>,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self::new(vec![
            subscription("Other", "sub-000", "tenant-000"),
            subscription("Sub1", SUBSCRIPTION_ID, TENANT_ID),
        ])
    }
}

impl FakeCloud {
    pub fn new(subscriptions: Vec<SubscriptionInfo>) -> Self {
        Self {
            subscriptions,
            list_batch_accounts: true,
            state: Arc::new(Mutex::new(FakeCloudState::default())),
        }
    }

    /// Pre-populate a resource group, e.g. with non-batch resources
    pub fn with_resource(self, resource_group: &str, resource: GenericResource) -> Self {
        self.state
            .lock()
            .resources
            .entry(resource_group.to_string())
            .or_default()
            .push(resource);
        self
    }

    /// Created accounts never appear in resource listings
    pub fn hiding_batch_accounts(mut self) -> Self {
        self.list_batch_accounts = false;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn pools(&self) -> Vec<Pool> {
        self.state.lock().pools.clone()
    }

    pub fn jobs(&self) -> Vec<JobAddParameter> {
        self.state.lock().jobs.clone()
    }

    pub fn tasks(&self) -> Vec<TaskAddParameter> {
        self.state.lock().tasks.clone()
    }

    pub fn created_pool_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreatePool { pool_name, .. } => Some(pool_name),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }
}

impl ClientFactory for FakeCloud {
    fn subscriptions(&self) -> ProvisionResult<Arc<dyn SubscriptionApi>> {
        Ok(Arc::new(self.clone()))
    }

    fn management(&self, subscription_id: &str) -> ProvisionResult<Arc<dyn ManagementApi>> {
        Ok(Arc::new(FakeManagement {
            cloud: self.clone(),
            subscription_id: subscription_id.to_string(),
        }))
    }

    fn batch_service(&self, endpoint: &BatchEndpoint) -> ProvisionResult<Arc<dyn BatchServiceApi>> {
        Ok(Arc::new(FakeBatchService {
            cloud: self.clone(),
            endpoint: endpoint.to_string(),
        }))
    }
}

#[async_trait]
impl SubscriptionApi for FakeCloud {
    async fn list_subscriptions(&self) -> ProvisionResult<Vec<SubscriptionInfo>> {
        self.record(Call::ListSubscriptions);
        Ok(self.subscriptions.clone())
    }
}

pub struct FakeManagement {
    cloud: FakeCloud,
    subscription_id: String,
}

fn succeeded_account(name: &str, location: &str) -> BatchAccount {
    BatchAccount {
        name: name.to_string(),
        location: location.to_string(),
        properties: BatchAccountProperties {
            account_endpoint: Some(format!("{name}.{location}.batch.azure.com")),
            provisioning_state: Some(ProvisioningState::Succeeded),
        },
    }
}

#[async_trait]
impl ManagementApi for FakeManagement {
    fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    async fn begin_create_batch_account(
        &self,
        resource_group: &str,
        account_name: &str,
        parameters: &BatchAccountCreateParameters,
    ) -> ProvisionResult<Option<BatchAccount>> {
        self.cloud.record(Call::CreateBatchAccount {
            resource_group: resource_group.to_string(),
            account_name: account_name.to_string(),
            location: parameters.location.clone(),
        });

        let mut state = self.cloud.state.lock();
        let resources = state.resources.entry(resource_group.to_string()).or_default();
        if !resources.iter().any(|r| r.name == account_name) {
            resources.push(GenericResource {
                name: account_name.to_string(),
                resource_type: BATCH_ACCOUNT_RESOURCE_TYPE.to_string(),
                location: parameters.location.clone(),
            });
        }

        Ok(Some(succeeded_account(account_name, &parameters.location)))
    }

    async fn get_batch_account(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> ProvisionResult<BatchAccount> {
        self.cloud.record(Call::GetBatchAccount {
            account_name: account_name.to_string(),
        });
        let location = self
            .cloud
            .state
            .lock()
            .resources
            .get(resource_group)
            .and_then(|resources| resources.iter().find(|r| r.name == account_name))
            .map(|r| r.location.clone())
            .unwrap_or_default();
        Ok(succeeded_account(account_name, &location))
    }

    async fn list_resources(&self, resource_group: &str) -> ProvisionResult<Vec<GenericResource>> {
        self.cloud.record(Call::ListResources {
            resource_group: resource_group.to_string(),
        });
        let resources = self
            .cloud
            .state
            .lock()
            .resources
            .get(resource_group)
            .cloned()
            .unwrap_or_default();
        Ok(resources
            .into_iter()
            .filter(|r| self.cloud.list_batch_accounts || !r.is_batch_account())
            .collect())
    }

    async fn create_pool(
        &self,
        _resource_group: &str,
        account_name: &str,
        pool_name: &str,
        pool: &Pool,
    ) -> ProvisionResult<()> {
        self.cloud.record(Call::CreatePool {
            account_name: account_name.to_string(),
            pool_name: pool_name.to_string(),
        });
        self.cloud.state.lock().pools.push(pool.clone());
        Ok(())
    }
}

pub struct FakeBatchService {
    cloud: FakeCloud,
    endpoint: String,
}

#[async_trait]
impl BatchServiceApi for FakeBatchService {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn add_job(&self, job: &JobAddParameter) -> ProvisionResult<()> {
        self.cloud.record(Call::AddJob {
            endpoint: self.endpoint.clone(),
            job_id: job.id.clone(),
        });
        self.cloud.state.lock().jobs.push(job.clone());
        Ok(())
    }

    async fn add_task(&self, job_id: &str, task: &TaskAddParameter) -> ProvisionResult<()> {
        self.cloud.record(Call::AddTask {
            endpoint: self.endpoint.clone(),
            job_id: job_id.to_string(),
            task_id: task.id.clone(),
        });
        self.cloud.state.lock().tasks.push(task.clone());
        Ok(())
    }
}

pub fn subscription(name: &str, id: &str, tenant: &str) -> SubscriptionInfo {
    SubscriptionInfo {
        display_name: name.to_string(),
        subscription_id: id.to_string(),
        tenant_id: tenant.to_string(),
    }
}

pub fn identity_config() -> ProvisionConfig {
    ProvisionConfig {
        subscription: "Sub1".to_string(),
        rg: "rg1".to_string(),
        region: "eastus".to_string(),
        acrserver: "myreg.azurecr.io".to_string(),
        acrimage: "app".to_string(),
        acrimage_tag: "v1".to_string(),
        acruseridentity: Some(IDENTITY.to_string()),
    }
}

/// Write `contents` to a temporary `.json` file kept alive by the returned handle
pub fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("create temp config file");
    file.write_all(contents.as_bytes())
        .expect("write temp config file");
    file
}
