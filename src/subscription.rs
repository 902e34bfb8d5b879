//! # Subscription Resolution
//!
//! Maps the human-readable subscription name from the configuration file to the
//! subscription id and tenant id the rest of the run needs.
//!
//! There is a single lookup contract, [`find_subscription`], which reports a miss as
//! `None`. Callers that cannot continue without a subscription escalate the miss to
//! [`ProvisionError::SubscriptionNotFound`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api_clients::SubscriptionApi;
use crate::error::{ProvisionError, ProvisionResult};

/// A subscription visible to the ambient credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    pub display_name: String,
    pub subscription_id: String,
    pub tenant_id: String,
}

/// First subscription whose display name equals `name` exactly (case-sensitive)
pub async fn find_subscription(
    api: &dyn SubscriptionApi,
    name: &str,
) -> ProvisionResult<Option<SubscriptionInfo>> {
    let subscriptions = api.list_subscriptions().await?;
    debug!(
        visible = subscriptions.len(),
        name = name,
        "Scanning subscriptions"
    );

    Ok(subscriptions
        .into_iter()
        .find(|subscription| subscription.display_name == name))
}

/// Subscription id for `name`, or `None` if no subscription matches
pub async fn resolve_subscription_id(
    api: &dyn SubscriptionApi,
    name: &str,
) -> ProvisionResult<Option<String>> {
    Ok(find_subscription(api, name)
        .await?
        .map(|subscription| subscription.subscription_id))
}

/// Tenant id for `name`; a miss is an error
pub async fn resolve_tenant_id(api: &dyn SubscriptionApi, name: &str) -> ProvisionResult<String> {
    resolve_subscription(api, name)
        .await
        .map(|subscription| subscription.tenant_id)
}

/// Full subscription record for `name`; a miss is an error
pub async fn resolve_subscription(
    api: &dyn SubscriptionApi,
    name: &str,
) -> ProvisionResult<SubscriptionInfo> {
    find_subscription(api, name)
        .await?
        .ok_or_else(|| ProvisionError::SubscriptionNotFound {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticSubscriptions(Vec<SubscriptionInfo>);

    #[async_trait]
    impl SubscriptionApi for StaticSubscriptions {
        async fn list_subscriptions(&self) -> ProvisionResult<Vec<SubscriptionInfo>> {
            Ok(self.0.clone())
        }
    }

    fn subscription(name: &str, id: &str, tenant: &str) -> SubscriptionInfo {
        SubscriptionInfo {
            display_name: name.to_string(),
            subscription_id: id.to_string(),
            tenant_id: tenant.to_string(),
        }
    }

    fn api() -> StaticSubscriptions {
        StaticSubscriptions(vec![
            subscription("Dev", "sub-001", "tenant-001"),
            subscription("Sub1", "sub-123", "tenant-456"),
            subscription("Sub1", "sub-999", "tenant-999"),
        ])
    }

    #[tokio::test]
    async fn test_match_returns_id_and_tenant() {
        let api = api();
        assert_eq!(
            resolve_subscription_id(&api, "Sub1").await.unwrap().as_deref(),
            Some("sub-123")
        );
        assert_eq!(resolve_tenant_id(&api, "Sub1").await.unwrap(), "tenant-456");
    }

    #[tokio::test]
    async fn test_subscription_id_miss_is_absent() {
        let api = api();
        assert_eq!(resolve_subscription_id(&api, "Missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tenant_miss_is_fatal() {
        let api = api();
        let err = resolve_tenant_id(&api, "Missing").await.unwrap_err();
        assert!(matches!(err, ProvisionError::SubscriptionNotFound { ref name } if name == "Missing"));
        assert_eq!(err.to_string(), "Cannot find subscription: Missing");
    }

    #[tokio::test]
    async fn test_match_is_case_sensitive() {
        let api = api();
        assert!(find_subscription(&api, "sub1").await.unwrap().is_none());
        assert!(find_subscription(&api, "Sub1 ").await.unwrap().is_none());
    }
}
