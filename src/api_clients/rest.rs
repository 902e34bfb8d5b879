//! Bearer-authenticated JSON transport shared by the management and data-plane clients.

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use super::models::Page;
use crate::auth::TokenCredential;
use crate::config::ClientSettings;
use crate::error::{ProvisionError, ProvisionResult};

/// HTTP client bound to one token scope
#[derive(Clone)]
pub struct AzureRestClient {
    client: Client,
    credential: Arc<dyn TokenCredential>,
    scope: String,
    content_type: &'static str,
}

impl std::fmt::Debug for AzureRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureRestClient")
            .field("credential", &self.credential.name())
            .field("scope", &self.scope)
            .finish()
    }
}

/// Outcome of a PUT that may start a long-running operation
#[derive(Debug)]
pub enum PutOutcome<T> {
    /// The service returned the resource representation
    Resource(T),
    /// `202 Accepted` without a body; the resource must be polled
    Accepted,
}

impl AzureRestClient {
    pub fn new(
        credential: Arc<dyn TokenCredential>,
        scope: impl Into<String>,
        settings: &ClientSettings,
    ) -> ProvisionResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(format!("batch-provision/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ProvisionError::configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            credential,
            scope: scope.into(),
            content_type: "application/json",
        })
    }

    /// Use a different request content type (the batch data plane expects OData JSON)
    #[must_use]
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = content_type;
        self
    }

    /// Parse `base` + `path` and append `api-version`
    pub fn url(base: &str, path: &str, api_version: &str) -> ProvisionResult<Url> {
        let mut url = Url::parse(&format!("{}{}", base.trim_end_matches('/'), path))
            .map_err(|e| ProvisionError::configuration(format!("Failed to construct URL: {e}")))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    async fn request(&self, method: Method, url: Url) -> ProvisionResult<RequestBuilder> {
        let token = self.credential.get_token(&self.scope).await?;
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            self.content_type
                .parse()
                .map_err(|e| ProvisionError::configuration(format!("Invalid content type: {e}")))?,
        );
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(token.token)
            .headers(headers))
    }

    pub async fn get_json<T>(&self, url: Url, operation: &str) -> ProvisionResult<T>
    where
        T: DeserializeOwned,
    {
        debug!(url = %url, operation = operation, "GET");
        let response = self.request(Method::GET, url).await?.send().await?;
        Self::handle_response(response, operation).await
    }

    /// GET every page of a list operation, following `nextLink`
    pub async fn get_all_pages<T>(&self, url: Url, operation: &str) -> ProvisionResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let page: Page<T> = self.get_json(url, operation).await?;
            items.extend(page.value);
            if let Some(link) = page.next_link.filter(|link| !link.is_empty()) {
                next = Some(Url::parse(&link).map_err(|e| {
                    ProvisionError::invalid_response("nextLink", e.to_string())
                })?);
            }
        }
        Ok(items)
    }

    pub async fn put_json<B, T>(
        &self,
        url: Url,
        body: &B,
        operation: &str,
    ) -> ProvisionResult<PutOutcome<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(url = %url, operation = operation, "PUT");
        let response = self
            .request(Method::PUT, url)
            .await?
            .json(body)
            .send()
            .await?;

        if response.status() == StatusCode::ACCEPTED {
            let body = response.text().await?;
            if body.trim().is_empty() {
                debug!(operation = operation, "Operation accepted, resource must be polled");
                return Ok(PutOutcome::Accepted);
            }
            return Ok(PutOutcome::Resource(serde_json::from_str(&body)?));
        }

        Self::handle_response(response, operation)
            .await
            .map(PutOutcome::Resource)
    }

    /// POST a body where the service answers with an empty `201 Created`
    pub async fn post_no_content<B>(&self, url: Url, body: &B, operation: &str) -> ProvisionResult<()>
    where
        B: Serialize + ?Sized,
    {
        debug!(url = %url, operation = operation, "POST");
        let response = self
            .request(Method::POST, url)
            .await?
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            debug!("Successfully completed operation: {}", operation);
            Ok(())
        } else {
            Err(Self::error_from_response(response, operation).await)
        }
    }

    async fn handle_response<T>(response: Response, operation: &str) -> ProvisionResult<T>
    where
        T: DeserializeOwned,
    {
        if response.status().is_success() {
            let result = response.json::<T>().await.map_err(|e| {
                ProvisionError::invalid_response(operation, format!("Failed to parse response: {e}"))
            })?;

            debug!("Successfully completed operation: {}", operation);
            Ok(result)
        } else {
            Err(Self::error_from_response(response, operation).await)
        }
    }

    async fn error_from_response(response: Response, operation: &str) -> ProvisionError {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(status = %status, error = %error_text, "Failed operation: {}", operation);
        ProvisionError::api_error(status.as_u16(), error_text)
    }
}
