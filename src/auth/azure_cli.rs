use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

use super::{AccessToken, TokenCredential};
use crate::error::{ProvisionError, ProvisionResult};

/// Token from the Azure CLI's logged-in account (`az account get-access-token`)
#[derive(Debug, Default)]
pub struct AzureCliCredential;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
    /// Local time, `%Y-%m-%d %H:%M:%S%.f`; present in every CLI version
    expires_on: String,
    /// Unix timestamp, only in newer CLI versions
    #[serde(rename = "expires_on")]
    expires_on_timestamp: Option<i64>,
}

impl AzureCliCredential {
    pub fn new() -> Self {
        Self
    }
}

fn program() -> &'static str {
    if cfg!(windows) {
        "az.cmd"
    } else {
        "az"
    }
}

fn check_command_output(output: Output) -> ProvisionResult<Output> {
    if !output.status.success() {
        return Err(ProvisionError::credential(format!(
            "az exited with code {}: {}",
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(output)
}

fn parse_cli_token(stdout: &str) -> ProvisionResult<AccessToken> {
    let response: CliTokenResponse = serde_json::from_str(stdout)?;

    let expires_on = match response.expires_on_timestamp {
        Some(timestamp) => DateTime::<Utc>::from_timestamp(timestamp, 0).ok_or_else(|| {
            ProvisionError::invalid_response("expires_on", format!("out of range: {timestamp}"))
        })?,
        None => {
            let naive = NaiveDateTime::parse_from_str(&response.expires_on, "%Y-%m-%d %H:%M:%S%.f")
                .map_err(|e| ProvisionError::invalid_response("expiresOn", e.to_string()))?;
            Local
                .from_local_datetime(&naive)
                .earliest()
                .ok_or_else(|| {
                    ProvisionError::invalid_response("expiresOn", "not a valid local time")
                })?
                .with_timezone(&Utc)
        }
    };

    Ok(AccessToken::new(response.access_token, expires_on))
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    fn name(&self) -> &'static str {
        "AzureCliCredential"
    }

    async fn get_token(&self, scope: &str) -> ProvisionResult<AccessToken> {
        let arguments = ["account", "get-access-token", "--scope", scope, "--output", "json"];
        debug!("Running command `{} {}`", program(), arguments.join(" "));

        let output = Command::new(program())
            .args(arguments)
            .output()
            .await
            .map_err(|e| ProvisionError::credential(format!("az start failed: {e}")))?;
        let output = check_command_output(output)?;

        let stdout = String::from_utf8(output.stdout).map_err(|e| {
            ProvisionError::credential(format!("Invalid UTF-8 in az output: {e}"))
        })?;
        parse_cli_token(stdout.trim())
    }
}
