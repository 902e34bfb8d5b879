//! Wire types for the Azure Resource Manager and Batch REST APIs.
//!
//! Only the fields this tool sends or reads are modelled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Resource type of a batch account as reported by resource listings
pub const BATCH_ACCOUNT_RESOURCE_TYPE: &str = "Microsoft.Batch/batchAccounts";

/// One page of a list operation
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

/// Entry of a resource-group resource listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericResource {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub location: String,
}

impl GenericResource {
    #[must_use]
    pub fn is_batch_account(&self) -> bool {
        self.resource_type
            .eq_ignore_ascii_case(BATCH_ACCOUNT_RESOURCE_TYPE)
    }
}

// ---------------------------------------------------------------------------
// Batch accounts (management plane)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceIdentityType {
    SystemAssigned,
    UserAssigned,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAccountIdentity {
    #[serde(rename = "type")]
    pub identity_type: ResourceIdentityType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoStorageBaseProperties {
    pub storage_account_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAccountCreateProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_storage: Option<AutoStorageBaseProperties>,
}

/// Body of `PUT .../batchAccounts/{name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAccountCreateParameters {
    pub location: String,
    pub identity: BatchAccountIdentity,
    pub properties: BatchAccountCreateProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningState {
    Invalid,
    Creating,
    Deleting,
    Succeeded,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl ProvisioningState {
    /// Check if this is a terminal state (the operation will not progress further)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Cancelled | Self::Invalid
        )
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "Invalid"),
            Self::Creating => write!(f, "Creating"),
            Self::Deleting => write!(f, "Deleting"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAccountProperties {
    #[serde(default)]
    pub account_endpoint: Option<String>,
    #[serde(default)]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAccount {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub properties: BatchAccountProperties,
}

impl BatchAccount {
    pub fn provisioning_state(&self) -> Option<ProvisioningState> {
        self.properties.provisioning_state
    }

    pub fn account_endpoint(&self) -> Option<&str> {
        self.properties.account_endpoint.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Pools (management plane)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeNodeIdentityReference {
    pub resource_id: String,
}

/// A private registry and how nodes authenticate to it
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRegistry {
    pub registry_server: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_reference: Option<ComputeNodeIdentityReference>,
}

impl fmt::Debug for ContainerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRegistry")
            .field("registry_server", &self.registry_server)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[MASKED]"))
            .field("identity_reference", &self.identity_reference)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerType {
    DockerCompatible,
    CriCompatible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerConfiguration {
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    pub container_image_names: Vec<String>,
    pub container_registries: Vec<ContainerRegistry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineConfiguration {
    pub image_reference: ImageReference,
    pub node_agent_sku_id: String,
    pub container_configuration: ContainerConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfiguration {
    pub virtual_machine_configuration: VirtualMachineConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedScaleSettings {
    pub target_dedicated_nodes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSettings {
    pub fixed_scale: FixedScaleSettings,
}

/// Empty marker object keyed by identity resource id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAssignedIdentity {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPoolIdentity {
    #[serde(rename = "type")]
    pub identity_type: ResourceIdentityType,
    pub user_assigned_identities: BTreeMap<String, UserAssignedIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolProperties {
    pub vm_size: String,
    pub deployment_configuration: DeploymentConfiguration,
    pub scale_settings: ScaleSettings,
}

/// Body of `PUT .../batchAccounts/{account}/pools/{pool}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<BatchPoolIdentity>,
    pub properties: PoolProperties,
}

impl Pool {
    pub fn container_configuration(&self) -> &ContainerConfiguration {
        &self
            .properties
            .deployment_configuration
            .virtual_machine_configuration
            .container_configuration
    }
}

// ---------------------------------------------------------------------------
// Jobs and tasks (data plane)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInformation {
    pub pool_id: String,
}

/// Body of `POST {endpoint}/jobs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAddParameter {
    pub id: String,
    pub pool_info: PoolInformation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskContainerSettings {
    pub image_name: String,
    pub container_run_options: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AutoUserScope {
    Task,
    Pool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElevationLevel {
    NonAdmin,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoUserSpecification {
    pub scope: AutoUserScope,
    pub elevation_level: ElevationLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub auto_user: AutoUserSpecification,
}

/// Body of `POST {endpoint}/jobs/{job}/tasks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAddParameter {
    pub id: String,
    pub command_line: String,
    pub container_settings: TaskContainerSettings,
    pub user_identity: UserIdentity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_account_create_parameters_shape() {
        let params = BatchAccountCreateParameters {
            location: "eastus".to_string(),
            identity: BatchAccountIdentity {
                identity_type: ResourceIdentityType::SystemAssigned,
            },
            properties: BatchAccountCreateProperties::default(),
        };

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "location": "eastus",
                "identity": {"type": "SystemAssigned"},
                "properties": {}
            })
        );
    }

    #[test]
    fn test_batch_account_parses_provisioning_state() {
        let account: BatchAccount = serde_json::from_value(json!({
            "id": "/subscriptions/sub-123/resourceGroups/rg1/providers/Microsoft.Batch/batchAccounts/rg1ba",
            "name": "rg1ba",
            "location": "eastus",
            "properties": {
                "accountEndpoint": "rg1ba.eastus.batch.azure.com",
                "provisioningState": "Succeeded",
                "poolAllocationMode": "BatchService"
            }
        }))
        .unwrap();

        assert_eq!(account.provisioning_state(), Some(ProvisioningState::Succeeded));
        assert_eq!(account.account_endpoint(), Some("rg1ba.eastus.batch.azure.com"));
    }

    #[test]
    fn test_unknown_provisioning_state_is_not_terminal() {
        let state: ProvisioningState = serde_json::from_value(json!("Upgrading")).unwrap();
        assert_eq!(state, ProvisioningState::Unknown);
        assert!(!state.is_terminal());
        assert!(ProvisioningState::Failed.is_terminal());
    }

    #[test]
    fn test_resource_type_match_ignores_case() {
        let resource: GenericResource = serde_json::from_value(json!({
            "name": "rg1ba",
            "type": "microsoft.batch/batchaccounts",
            "location": "eastus"
        }))
        .unwrap();
        assert!(resource.is_batch_account());
    }

    #[test]
    fn test_task_user_identity_shape() {
        let identity = UserIdentity {
            auto_user: AutoUserSpecification {
                scope: AutoUserScope::Pool,
                elevation_level: ElevationLevel::Admin,
            },
        };
        assert_eq!(
            serde_json::to_value(identity).unwrap(),
            json!({"autoUser": {"scope": "pool", "elevationLevel": "admin"}})
        );
    }

    #[test]
    fn test_registry_debug_masks_password() {
        let registry = ContainerRegistry {
            registry_server: "myreg.azurecr.io".to_string(),
            username: Some("user".to_string()),
            password: Some("hunter2".to_string()),
            identity_reference: None,
        };
        assert!(!format!("{registry:?}").contains("hunter2"));
    }
}
