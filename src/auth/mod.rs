//! # Ambient Credentials
//!
//! Bearer tokens for Azure Resource Manager and the batch data plane. The tool never
//! stores secrets of its own: tokens come from a service principal in the environment
//! or from a logged-in Azure CLI, whichever answers first.

mod azure_cli;
mod default;
mod environment;

pub use azure_cli::AzureCliCredential;
pub use default::DefaultCredential;
pub use environment::EnvironmentCredential;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::ProvisionResult;

/// Tokens closer than this to expiry are not handed out from the cache
const EXPIRY_MARGIN_SECONDS: i64 = 300;

/// An OAuth2 bearer token and its expiry
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }

    /// True if the token is still usable at `now` with the safety margin applied
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_on - Duration::seconds(EXPIRY_MARGIN_SECONDS) > now
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[MASKED]")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens for a given scope
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Acquire a token for `scope`, e.g. `https://management.azure.com/.default`
    async fn get_token(&self, scope: &str) -> ProvisionResult<AccessToken>;
}

#[async_trait]
impl<T: TokenCredential + ?Sized> TokenCredential for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn get_token(&self, scope: &str) -> ProvisionResult<AccessToken> {
        (**self).get_token(scope).await
    }
}

/// Reuses a token per scope until it is about to expire
pub struct CachingCredential<C> {
    inner: C,
    tokens: Mutex<HashMap<String, AccessToken>>,
}

impl<C: TokenCredential> CachingCredential<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            tokens: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<C: TokenCredential> TokenCredential for CachingCredential<C> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn get_token(&self, scope: &str) -> ProvisionResult<AccessToken> {
        let cached = self
            .tokens
            .lock()
            .get(scope)
            .filter(|token| token.is_fresh_at(Utc::now()))
            .cloned();
        if let Some(token) = cached {
            return Ok(token);
        }

        let token = self.inner.get_token(scope).await?;
        debug!(
            scope = scope,
            credential = self.inner.name(),
            expires_on = %token.expires_on,
            "Acquired access token"
        );
        self.tokens.lock().insert(scope.to_string(), token.clone());
        Ok(token)
    }
}
