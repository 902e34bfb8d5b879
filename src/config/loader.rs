//! Configuration Loader
//!
//! Reads the JSON document named on the command line through the `config` crate and
//! turns it into a validated [`ProvisionConfig`]. Nothing is created in the cloud
//! until this has succeeded.

use config::{Config, ConfigError, File, FileFormat};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::{ProvisionConfig, REGISTRY_IDENTITY_KEY, REQUIRED_KEYS};
use crate::error::{ProvisionError, ProvisionResult};

impl ProvisionConfig {
    /// Load and validate a configuration file
    ///
    /// Fails with [`ProvisionError::ConfigFileNotFound`] if the path does not exist,
    /// [`ProvisionError::ConfigParse`] if it is not a JSON object, and
    /// [`ProvisionError::MissingConfigKeys`] listing every absent required key.
    /// Keys match exactly: `RG` does not stand in for `rg`.
    pub fn load_from_file(path: &Path) -> ProvisionResult<Self> {
        if !path.exists() {
            return Err(ProvisionError::ConfigFileNotFound {
                path: path.to_path_buf(),
            });
        }

        debug!(path = %path.display(), "Loading provisioning configuration");

        let parse_error = |source: ConfigError| ProvisionError::ConfigParse {
            path: path.to_path_buf(),
            source,
        };

        let text = fs::read_to_string(path)?;
        let document = Config::builder()
            .add_source(File::from_str(&text, FileFormat::Json))
            .build()
            .map_err(parse_error)?;
        // `config` folds key case, so presence is decided on the keys as written
        let written = WrittenKeys::parse(&text)?;

        let lookup = |key: &str| -> ProvisionResult<Option<String>> {
            if !written.contains(key) {
                return Ok(None);
            }
            if written.case_variants(key) > 1 {
                return Err(parse_error(ConfigError::Message(format!(
                    "key `{key}` is given more than once with different letter case"
                ))));
            }
            lookup_string(&document, key).map_err(parse_error)
        };

        let mut found = HashMap::with_capacity(REQUIRED_KEYS.len());
        let mut missing = Vec::new();
        for key in REQUIRED_KEYS {
            match lookup(key)? {
                Some(value) => {
                    found.insert(key, value);
                }
                None => {
                    warn!(key = key, "Missing key in config file");
                    missing.push(key.to_string());
                }
            }
        }

        if !missing.is_empty() {
            return Err(ProvisionError::MissingConfigKeys { keys: missing });
        }

        let acruseridentity = lookup(REGISTRY_IDENTITY_KEY)?;

        // every required key is in `found` at this point
        let mut take = |key: &str| found.remove(key).unwrap_or_default();
        let config = ProvisionConfig {
            subscription: take("subscription"),
            rg: take("rg"),
            region: take("region"),
            acrserver: take("acrserver"),
            acrimage: take("acrimage"),
            acrimage_tag: take("acrimage_tag"),
            acruseridentity,
        };

        debug!(
            subscription = %config.subscription,
            resource_group = %config.rg,
            region = %config.region,
            image = %config.container_image(),
            registry_identity = config.acruseridentity.is_some(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }
}

/// Top-level keys of the document, exactly as written
struct WrittenKeys(Vec<String>);

impl WrittenKeys {
    fn parse(text: &str) -> ProvisionResult<Self> {
        let object: Map<String, Value> = serde_json::from_str(text)?;
        Ok(Self(object.into_iter().map(|(key, _)| key).collect()))
    }

    fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|written| written == key)
    }

    fn case_variants(&self, key: &str) -> usize {
        self.0
            .iter()
            .filter(|written| written.eq_ignore_ascii_case(key))
            .count()
    }
}

/// Read a key as a string; numbers and booleans are converted, absence is `None`
fn lookup_string(document: &Config, key: &str) -> Result<Option<String>, ConfigError> {
    match document.get_string(key) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
