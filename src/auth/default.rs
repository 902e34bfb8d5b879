use async_trait::async_trait;
use tracing::{debug, warn};

use super::{AccessToken, AzureCliCredential, EnvironmentCredential, TokenCredential};
use crate::config::ClientSettings;
use crate::error::{ProvisionError, ProvisionResult};

/// Ordered chain of ambient credentials; the first one that yields a token wins
pub struct DefaultCredential {
    sources: Vec<Box<dyn TokenCredential>>,
}

impl DefaultCredential {
    /// Environment service principal (when configured), then the Azure CLI
    pub fn new(settings: &ClientSettings) -> ProvisionResult<Self> {
        let mut sources: Vec<Box<dyn TokenCredential>> = Vec::new();
        if let Some(environment) = EnvironmentCredential::from_env(settings)? {
            sources.push(Box::new(environment));
        }
        sources.push(Box::new(AzureCliCredential::new()));

        let credential = Self { sources };
        debug!(sources = ?credential.source_names(), "Ambient credential chain");
        Ok(credential)
    }

    pub fn from_sources(sources: Vec<Box<dyn TokenCredential>>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }
}

#[async_trait]
impl TokenCredential for DefaultCredential {
    fn name(&self) -> &'static str {
        "DefaultCredential"
    }

    async fn get_token(&self, scope: &str) -> ProvisionResult<AccessToken> {
        let mut failures = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            match source.get_token(scope).await {
                Ok(token) => {
                    debug!(credential = source.name(), scope = scope, "Credential succeeded");
                    return Ok(token);
                }
                Err(e) => {
                    warn!(credential = source.name(), error = %e, "Credential unavailable");
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        Err(ProvisionError::credential(format!(
            "no ambient credential could provide a token for {scope} ({})",
            failures.join("; ")
        )))
    }
}
