//! # Batch Service Client
//!
//! Data-plane client for one batch account endpoint. Requests carry a token for the
//! batch audience, not the Resource Manager one.

use async_trait::async_trait;
use tracing::info;

use super::models::{JobAddParameter, TaskAddParameter};
use super::rest::AzureRestClient;
use super::BatchServiceApi;
use crate::error::ProvisionResult;

const ODATA_JSON: &str = "application/json; odata=minimalmetadata";

#[derive(Debug, Clone)]
pub struct BatchServiceClient {
    rest: AzureRestClient,
    endpoint: String,
    api_version: String,
}

impl BatchServiceClient {
    pub fn new(rest: AzureRestClient, endpoint: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            rest: rest.with_content_type(ODATA_JSON),
            endpoint: endpoint.into(),
            api_version: api_version.into(),
        }
    }
}

#[async_trait]
impl BatchServiceApi for BatchServiceClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn add_job(&self, job: &JobAddParameter) -> ProvisionResult<()> {
        let url = AzureRestClient::url(&self.endpoint, "/jobs", &self.api_version)?;
        info!(job_id = %job.id, pool_id = %job.pool_info.pool_id, "Adding job");
        self.rest.post_no_content(url, job, "add job").await
    }

    async fn add_task(&self, job_id: &str, task: &TaskAddParameter) -> ProvisionResult<()> {
        let url = AzureRestClient::url(
            &self.endpoint,
            &format!("/jobs/{job_id}/tasks"),
            &self.api_version,
        )?;
        info!(job_id = job_id, task_id = %task.id, "Adding task");
        self.rest.post_no_content(url, task, "add task").await
    }
}
