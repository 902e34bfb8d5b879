//! Container pool creation.
//!
//! The pool runs one dedicated node from a fixed Ubuntu HPC image and pre-pulls the
//! configured container image from a private registry.

use std::collections::BTreeMap;
use std::fmt;

use crate::api_clients::models::{
    BatchPoolIdentity, ComputeNodeIdentityReference, ContainerConfiguration, ContainerRegistry,
    ContainerType, DeploymentConfiguration, FixedScaleSettings, ImageReference, Pool,
    PoolProperties, ResourceIdentityType, ScaleSettings, UserAssignedIdentity,
    VirtualMachineConfiguration,
};
use crate::api_clients::ManagementApi;
use crate::config::{ProvisionConfig, ResolvedConfig};
use crate::error::{ProvisionError, ProvisionResult};
use crate::logging::log_provision_operation;
use crate::naming;

pub const VM_SIZE: &str = "STANDARD_D2S_V3";
pub const NODE_AGENT_SKU_ID: &str = "batch.node.ubuntu 22.04";
pub const TARGET_DEDICATED_NODES: u32 = 1;

pub const ACR_USERNAME_VAR: &str = "ACR_USERNAME";
pub const ACR_PASSWORD_VAR: &str = "ACR_PASSWORD";

/// Marketplace image every node boots from
pub fn image_reference() -> ImageReference {
    ImageReference {
        publisher: "microsoft-dsvm".to_string(),
        offer: "ubuntu-hpc".to_string(),
        sku: "2204".to_string(),
        version: "latest".to_string(),
    }
}

/// Explicit registry login taken from the environment
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"[MASKED]")
            .finish()
    }
}

impl RegistryCredentials {
    /// `ACR_USERNAME` and `ACR_PASSWORD`, only when both are set
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Some(Self {
            username: lookup(ACR_USERNAME_VAR)?,
            password: lookup(ACR_PASSWORD_VAR)?,
        })
    }
}

/// How pool nodes authenticate to the container registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryAuth {
    Credentials(RegistryCredentials),
    Identity { resource_id: String },
}

impl RegistryAuth {
    /// Explicit credentials win over the configured identity; neither is an error
    pub fn select(
        credentials: Option<&RegistryCredentials>,
        identity: Option<&str>,
    ) -> ProvisionResult<Self> {
        match (credentials, identity) {
            (Some(credentials), _) => Ok(Self::Credentials(credentials.clone())),
            (None, Some(resource_id)) => Ok(Self::Identity {
                resource_id: resource_id.to_string(),
            }),
            (None, None) => Err(ProvisionError::NoRegistryCredentials),
        }
    }

    /// Operator-facing line naming the chosen method
    pub fn describe(&self) -> String {
        match self {
            Self::Credentials(_) => {
                "using ACR_USERNAME and ACR_PASSWORD to authenticate to ACR".to_string()
            }
            Self::Identity { resource_id } => {
                format!("using acruseridentity from config to ACR: {resource_id}")
            }
        }
    }

    pub fn container_registry(&self, registry_server: &str) -> ContainerRegistry {
        match self {
            Self::Credentials(credentials) => ContainerRegistry {
                registry_server: registry_server.to_string(),
                username: Some(credentials.username.clone()),
                password: Some(credentials.password.clone()),
                identity_reference: None,
            },
            Self::Identity { resource_id } => ContainerRegistry {
                registry_server: registry_server.to_string(),
                username: None,
                password: None,
                identity_reference: Some(ComputeNodeIdentityReference {
                    resource_id: resource_id.clone(),
                }),
            },
        }
    }
}

/// Pool body for `config` authenticating to the registry with `auth`
///
/// The pool carries the configured user-assigned identity whenever one is
/// configured, whichever registry authentication was chosen.
pub fn build_pool(config: &ProvisionConfig, auth: &RegistryAuth) -> Pool {
    let container_configuration = ContainerConfiguration {
        container_type: ContainerType::DockerCompatible,
        container_image_names: vec![config.container_image()],
        container_registries: vec![auth.container_registry(&config.acrserver)],
    };

    let identity = config
        .acruseridentity
        .as_ref()
        .map(|resource_id| BatchPoolIdentity {
            identity_type: ResourceIdentityType::UserAssigned,
            user_assigned_identities: BTreeMap::from([(
                resource_id.clone(),
                UserAssignedIdentity::default(),
            )]),
        });

    Pool {
        identity,
        properties: PoolProperties {
            vm_size: VM_SIZE.to_string(),
            deployment_configuration: DeploymentConfiguration {
                virtual_machine_configuration: VirtualMachineConfiguration {
                    image_reference: image_reference(),
                    node_agent_sku_id: NODE_AGENT_SKU_ID.to_string(),
                    container_configuration,
                },
            },
            scale_settings: ScaleSettings {
                fixed_scale: FixedScaleSettings {
                    target_dedicated_nodes: TARGET_DEDICATED_NODES,
                },
            },
        },
    }
}

/// Submit a new pool under the run's batch account and return its generated name
///
/// The request is not retried and the tool does not wait for nodes to come up.
pub async fn create_pool(
    management: &dyn ManagementApi,
    resolved: &ResolvedConfig,
    auth: &RegistryAuth,
) -> ProvisionResult<String> {
    let pool_name = naming::pool_id();
    let pool = build_pool(&resolved.config, auth);

    println!("creating pool {pool_name}");
    log_provision_operation("create", "pool", Some(&pool_name), "started", None);
    management
        .create_pool(
            resolved.resource_group(),
            &resolved.batch_account_name,
            &pool_name,
            &pool,
        )
        .await?;
    log_provision_operation("create", "pool", Some(&pool_name), "submitted", None);

    Ok(pool_name)
}
