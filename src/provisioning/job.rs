//! Job and task submission on the batch data plane.

use crate::api_clients::models::{
    AutoUserScope, AutoUserSpecification, ElevationLevel, JobAddParameter, PoolInformation,
    TaskAddParameter, TaskContainerSettings, UserIdentity,
};
use crate::api_clients::BatchServiceApi;
use crate::config::ProvisionConfig;
use crate::error::ProvisionResult;
use crate::logging::log_provision_operation;
use crate::naming;

pub const CONTAINER_RUN_OPTIONS: &str = "--rm";

/// Shell invocation run inside the container; the task id is passed as input name
pub fn task_command_line(task_id: &str) -> String {
    format!("/bin/sh -c '/usr/local/bin/myapp.sh random_input_{task_id}'")
}

pub fn build_job(job_id: &str, pool_id: &str) -> JobAddParameter {
    JobAddParameter {
        id: job_id.to_string(),
        pool_info: PoolInformation {
            pool_id: pool_id.to_string(),
        },
    }
}

/// Task running `image` as the pool's admin auto-user
pub fn build_task(task_id: &str, image: &str) -> TaskAddParameter {
    TaskAddParameter {
        id: task_id.to_string(),
        command_line: task_command_line(task_id),
        container_settings: TaskContainerSettings {
            image_name: image.to_string(),
            container_run_options: CONTAINER_RUN_OPTIONS.to_string(),
        },
        user_identity: UserIdentity {
            auto_user: AutoUserSpecification {
                scope: AutoUserScope::Pool,
                elevation_level: ElevationLevel::Admin,
            },
        },
    }
}

/// Create a job bound to `pool_id` and return its generated id
///
/// The pool is referenced by id only; its existence is not checked.
pub async fn create_job(batch: &dyn BatchServiceApi, pool_id: &str) -> ProvisionResult<String> {
    let job_id = naming::job_id();
    println!("creating job {job_id}");
    log_provision_operation("create", "job", Some(&job_id), "started", Some(pool_id));
    batch.add_job(&build_job(&job_id, pool_id)).await?;
    log_provision_operation("create", "job", Some(&job_id), "succeeded", None);
    Ok(job_id)
}

/// Submit the single task of the run under `job_id` and return its generated id
pub async fn create_task(
    batch: &dyn BatchServiceApi,
    config: &ProvisionConfig,
    job_id: &str,
) -> ProvisionResult<String> {
    let task_id = naming::task_id();
    let task = build_task(&task_id, &config.container_image());
    log_provision_operation("create", "task", Some(&task_id), "started", Some(job_id));
    batch.add_task(job_id, &task).await?;
    println!("Task created: {task_id}");
    log_provision_operation("create", "task", Some(&task_id), "succeeded", None);
    Ok(task_id)
}
