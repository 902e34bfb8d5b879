//! Batch account creation.

use std::time::Duration;
use tracing::debug;

use crate::api_clients::models::{
    BatchAccount, BatchAccountCreateParameters, BatchAccountCreateProperties,
    BatchAccountIdentity, ProvisioningState, ResourceIdentityType,
};
use crate::api_clients::ManagementApi;
use crate::error::{ProvisionError, ProvisionResult};
use crate::logging::log_provision_operation;

/// System-assigned identity, no auto-storage account
pub fn batch_account_parameters(region: &str) -> BatchAccountCreateParameters {
    BatchAccountCreateParameters {
        location: region.to_string(),
        identity: BatchAccountIdentity {
            identity_type: ResourceIdentityType::SystemAssigned,
        },
        properties: BatchAccountCreateProperties { auto_storage: None },
    }
}

/// Create (or update) the batch account and wait for the operation to finish
///
/// The account is polled every `poll_interval` until its provisioning state is
/// terminal. There is no deadline: the wait lasts as long as the service takes.
pub async fn create_batch_account(
    management: &dyn ManagementApi,
    resource_group: &str,
    account_name: &str,
    region: &str,
    poll_interval: Duration,
) -> ProvisionResult<BatchAccount> {
    log_provision_operation("create", "batch_account", Some(account_name), "started", Some(region));

    let parameters = batch_account_parameters(region);
    let mut current = management
        .begin_create_batch_account(resource_group, account_name, &parameters)
        .await?;

    let mut polls: u32 = 0;
    loop {
        if let Some(account) = current.take() {
            match account.provisioning_state() {
                Some(ProvisioningState::Succeeded) => {
                    log_provision_operation(
                        "create",
                        "batch_account",
                        Some(account_name),
                        "succeeded",
                        account.account_endpoint(),
                    );
                    return Ok(account);
                }
                Some(state) if state.is_terminal() => {
                    log_provision_operation(
                        "create",
                        "batch_account",
                        Some(account_name),
                        "failed",
                        Some(state.to_string().as_str()),
                    );
                    return Err(ProvisionError::LongRunningOperationFailed {
                        resource: format!("batch account {account_name}"),
                        state: state.to_string(),
                    });
                }
                state => {
                    debug!(account_name = account_name, state = ?state, polls = polls, "Batch account still provisioning");
                }
            }
        }

        tokio::time::sleep(poll_interval).await;
        polls += 1;
        current = Some(
            management
                .get_batch_account(resource_group, account_name)
                .await?,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_clients::models::{BatchAccountProperties, GenericResource, Pool};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Answers the PUT with `initial`, then each GET with the next queued state
    struct ScriptedAccount {
        initial: Option<ProvisioningState>,
        accepted: bool,
        polls: Mutex<Vec<ProvisioningState>>,
        gets: Mutex<u32>,
    }

    fn account(state: Option<ProvisioningState>) -> BatchAccount {
        BatchAccount {
            name: "rg1ba".to_string(),
            location: "eastus".to_string(),
            properties: BatchAccountProperties {
                account_endpoint: Some("rg1ba.eastus.batch.azure.com".to_string()),
                provisioning_state: state,
            },
        }
    }

    #[async_trait]
    impl ManagementApi for ScriptedAccount {
        fn subscription_id(&self) -> &str {
            "sub-123"
        }

        async fn begin_create_batch_account(
            &self,
            _resource_group: &str,
            _account_name: &str,
            parameters: &BatchAccountCreateParameters,
        ) -> ProvisionResult<Option<BatchAccount>> {
            assert_eq!(parameters.location, "eastus");
            if self.accepted {
                Ok(None)
            } else {
                Ok(Some(account(self.initial)))
            }
        }

        async fn get_batch_account(
            &self,
            _resource_group: &str,
            _account_name: &str,
        ) -> ProvisionResult<BatchAccount> {
            *self.gets.lock() += 1;
            let state = self.polls.lock().remove(0);
            Ok(account(Some(state)))
        }

        async fn list_resources(&self, _resource_group: &str) -> ProvisionResult<Vec<GenericResource>> {
            Ok(Vec::new())
        }

        async fn create_pool(
            &self,
            _resource_group: &str,
            _account_name: &str,
            _pool_name: &str,
            _pool: &Pool,
        ) -> ProvisionResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_immediate_success_does_not_poll() {
        let api = ScriptedAccount {
            initial: Some(ProvisioningState::Succeeded),
            accepted: false,
            polls: Mutex::new(Vec::new()),
            gets: Mutex::new(0),
        };

        let account = create_batch_account(&api, "rg1", "rg1ba", "eastus", Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(account.account_endpoint(), Some("rg1ba.eastus.batch.azure.com"));
        assert_eq!(*api.gets.lock(), 0);
    }

    #[tokio::test]
    async fn test_polls_until_succeeded() {
        let api = ScriptedAccount {
            initial: Some(ProvisioningState::Creating),
            accepted: false,
            polls: Mutex::new(vec![ProvisioningState::Creating, ProvisioningState::Succeeded]),
            gets: Mutex::new(0),
        };

        create_batch_account(&api, "rg1", "rg1ba", "eastus", Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(*api.gets.lock(), 2);
    }

    #[tokio::test]
    async fn test_accepted_without_body_is_polled() {
        let api = ScriptedAccount {
            initial: None,
            accepted: true,
            polls: Mutex::new(vec![ProvisioningState::Succeeded]),
            gets: Mutex::new(0),
        };

        create_batch_account(&api, "rg1", "rg1ba", "eastus", Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(*api.gets.lock(), 1);
    }

    #[tokio::test]
    async fn test_failed_operation_is_fatal() {
        let api = ScriptedAccount {
            initial: Some(ProvisioningState::Creating),
            accepted: false,
            polls: Mutex::new(vec![ProvisioningState::Failed]),
            gets: Mutex::new(0),
        };

        let err = create_batch_account(&api, "rg1", "rg1ba", "eastus", Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::LongRunningOperationFailed { ref state, .. } if state == "Failed"
        ));
    }

    #[test]
    fn test_parameters_use_system_assigned_identity() {
        let parameters = batch_account_parameters("eastus");
        assert_eq!(
            parameters.identity.identity_type,
            ResourceIdentityType::SystemAssigned
        );
        assert!(parameters.properties.auto_storage.is_none());
    }
}
