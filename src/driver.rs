//! # Provisioning Driver
//!
//! Runs the provisioning stages strictly in order, stopping at the first failure.
//! Errors leave the driver tagged with the [`ProvisionStage`] that produced them so
//! the CLI can report where the run stopped. Nothing created by earlier stages is
//! rolled back.
//!
//! Operator progress is printed to stdout; structured events go through `tracing`.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

use crate::client_factory::{build_batch_service_client, ClientFactory};
use crate::config::{ProvisionConfig, ResolvedConfig};
use crate::error::{ProvisionError, ProvisionResult};
use crate::provisioning::{
    create_batch_account, create_job, create_pool, create_task, RegistryAuth,
    RegistryCredentials,
};
use crate::subscription::resolve_subscription;

/// Stages of a provisioning run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStage {
    ParseArgs,
    LoadConfig,
    ResolveCredentials,
    ResolveTenant,
    CreateAccount,
    BuildClients,
    CreatePool,
    CreateJob,
    CreateTask,
    Done,
}

impl fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseArgs => write!(f, "parse arguments"),
            Self::LoadConfig => write!(f, "load config"),
            Self::ResolveCredentials => write!(f, "resolve credentials"),
            Self::ResolveTenant => write!(f, "resolve tenant"),
            Self::CreateAccount => write!(f, "create account"),
            Self::BuildClients => write!(f, "build clients"),
            Self::CreatePool => write!(f, "create pool"),
            Self::CreateJob => write!(f, "create job"),
            Self::CreateTask => write!(f, "create task"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// What a successful run created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub subscription_id: String,
    pub tenant_id: String,
    pub account_name: String,
    /// Endpoint reported by the management plane, if any
    pub account_endpoint: Option<String>,
    /// Data-plane URL used for the job and task
    pub batch_endpoint: String,
    pub pool_id: String,
    pub job_id: String,
    pub task_id: String,
}

impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch account: {}", self.account_name)?;
        writeln!(f, "Batch endpoint: {}", self.batch_endpoint)?;
        writeln!(f, "Pool: {}", self.pool_id)?;
        writeln!(f, "Job: {}", self.job_id)?;
        write!(f, "Task: {}", self.task_id)
    }
}

/// Drives one provisioning run against the clients produced by `F`
pub struct Provisioner<F: ClientFactory> {
    factory: F,
    poll_interval: Duration,
}

impl<F: ClientFactory> Provisioner<F> {
    pub fn new(factory: F, poll_interval: Duration) -> Self {
        Self {
            factory,
            poll_interval,
        }
    }

    /// Provision account, pool, job and task for `config`
    ///
    /// Registry authentication is chosen before the pool request is built, so a run
    /// with neither `registry_credentials` nor a configured identity stops without
    /// creating a pool. The account created before that point is left in place.
    #[instrument(skip_all, fields(rg = %config.rg, region = %config.region))]
    pub async fn run(
        &self,
        config: ProvisionConfig,
        registry_credentials: Option<RegistryCredentials>,
    ) -> ProvisionResult<ProvisionReport> {
        let mut stage = ProvisionStage::ResolveTenant;
        info!(stage = %stage, "Entering stage");
        let subscriptions = self
            .factory
            .subscriptions()
            .map_err(|e| e.at_stage(stage))?;
        let subscription = resolve_subscription(subscriptions.as_ref(), &config.subscription)
            .await
            .map_err(|e| e.at_stage(stage))?;
        let resolved = ResolvedConfig::new(config, &subscription);
        info!(
            subscription_id = %resolved.subscription_id,
            tenant_id = %resolved.tenant_id,
            "Resolved subscription"
        );

        stage = ProvisionStage::CreateAccount;
        info!(stage = %stage, "Entering stage");
        let management = self
            .factory
            .management(&resolved.subscription_id)
            .map_err(|e| e.at_stage(stage))?;
        let account = create_batch_account(
            management.as_ref(),
            resolved.resource_group(),
            &resolved.batch_account_name,
            resolved.region(),
            self.poll_interval,
        )
        .await
        .map_err(|e| e.at_stage(stage))?;
        let account_endpoint = account.account_endpoint().map(str::to_string);
        println!(
            "Batch URL: {}",
            account_endpoint.as_deref().unwrap_or("<unknown>")
        );

        stage = ProvisionStage::BuildClients;
        info!(stage = %stage, "Entering stage");
        let batch =
            build_batch_service_client(&self.factory, management.as_ref(), resolved.resource_group())
                .await
                .map_err(|e| e.at_stage(stage))?;

        stage = ProvisionStage::CreatePool;
        info!(stage = %stage, "Entering stage");
        let auth = RegistryAuth::select(registry_credentials.as_ref(), resolved.registry_identity())
            .map_err(|e| e.at_stage(stage))?;
        println!("{}", auth.describe());
        let pool_id = create_pool(management.as_ref(), &resolved, &auth)
            .await
            .map_err(|e| e.at_stage(stage))?;

        stage = ProvisionStage::CreateJob;
        info!(stage = %stage, "Entering stage");
        let job_id = create_job(batch.as_ref(), &pool_id)
            .await
            .map_err(|e| e.at_stage(stage))?;

        stage = ProvisionStage::CreateTask;
        info!(stage = %stage, "Entering stage");
        let task_id = create_task(batch.as_ref(), &resolved.config, &job_id)
            .await
            .map_err(|e| e.at_stage(stage))?;

        info!(stage = %ProvisionStage::Done, pool_id = %pool_id, job_id = %job_id, task_id = %task_id, "Provisioning complete");

        Ok(ProvisionReport {
            subscription_id: resolved.subscription_id,
            tenant_id: resolved.tenant_id,
            account_name: resolved.batch_account_name,
            account_endpoint,
            batch_endpoint: batch.endpoint().to_string(),
            pool_id,
            job_id,
            task_id,
        })
    }
}

/// Stage of a failed run, or [`ProvisionStage::Done`] for a success
///
/// Errors that never went through [`ProvisionError::at_stage`] are placed by their
/// root cause.
pub fn stopped_at(result: &ProvisionResult<ProvisionReport>) -> ProvisionStage {
    match result {
        Ok(_) => ProvisionStage::Done,
        Err(err) => err.stage().unwrap_or(match err.root() {
            ProvisionError::Usage(_) => ProvisionStage::ParseArgs,
            ProvisionError::Credential(_) => ProvisionStage::ResolveCredentials,
            _ => ProvisionStage::LoadConfig,
        }),
    }
}
