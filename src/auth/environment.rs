use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{AccessToken, TokenCredential};
use crate::config::ClientSettings;
use crate::error::{ProvisionError, ProvisionResult};

/// Service principal credential from `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and
/// `AZURE_CLIENT_SECRET`, using the OAuth2 client-credentials grant
pub struct EnvironmentCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    login_endpoint: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl EnvironmentCredential {
    /// Build from the process environment; `None` when any variable is unset
    pub fn from_env(settings: &ClientSettings) -> ProvisionResult<Option<Self>> {
        Self::from_lookup(settings, |name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(settings: &ClientSettings, lookup: F) -> ProvisionResult<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (Some(tenant_id), Some(client_id), Some(client_secret)) = (
            lookup("AZURE_TENANT_ID"),
            lookup("AZURE_CLIENT_ID"),
            lookup("AZURE_CLIENT_SECRET"),
        ) else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ProvisionError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Some(Self {
            tenant_id,
            client_id,
            client_secret,
            login_endpoint: settings.login_endpoint.clone(),
            client,
        }))
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_endpoint, self.tenant_id
        )
    }
}

#[async_trait]
impl TokenCredential for EnvironmentCredential {
    fn name(&self) -> &'static str {
        "EnvironmentCredential"
    }

    async fn get_token(&self, scope: &str) -> ProvisionResult<AccessToken> {
        let url = self.token_url();
        debug!(url = %url, client_id = %self.client_id, "Requesting client-credentials token");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope),
        ];
        let response = self.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProvisionError::credential(format!(
                "token request failed with HTTP {status}: {error_text}"
            )));
        }

        let body: TokenResponse = response.json().await?;
        Ok(AccessToken::new(
            body.access_token,
            Utc::now() + Duration::seconds(body.expires_in),
        ))
    }
}
