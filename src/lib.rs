#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Batch Provision
//!
//! Provisions a minimal Azure Batch deployment from a JSON configuration file: a
//! batch account, a one-node container pool pulling from a private registry, a job
//! bound to that pool and a single task running the container.
//!
//! ## Module Organization
//!
//! - [`config`] - Configuration file loading and REST client settings
//! - [`auth`] - Ambient Azure credentials (environment service principal, Azure CLI)
//! - [`subscription`] - Subscription display name to id and tenant resolution
//! - [`api_clients`] - Management and batch data-plane REST clients
//! - [`client_factory`] - Client construction and batch endpoint discovery
//! - [`provisioning`] - Account, pool, job and task creation
//! - [`driver`] - Ordered execution of the provisioning stages
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use batch_provision::auth::{CachingCredential, DefaultCredential};
//! use batch_provision::client_factory::AzureClientFactory;
//! use batch_provision::config::{ClientSettings, ProvisionConfig};
//! use batch_provision::driver::Provisioner;
//! use batch_provision::provisioning::RegistryCredentials;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProvisionConfig::load_from_file(Path::new("config.json"))?;
//! let settings = ClientSettings::load();
//!
//! let credential = Arc::new(CachingCredential::new(DefaultCredential::new(&settings)?));
//! let factory = AzureClientFactory::new(credential, settings.clone());
//!
//! let report = Provisioner::new(factory, settings.poll_interval())
//!     .run(config, RegistryCredentials::from_env())
//!     .await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod api_clients;
pub mod auth;
pub mod client_factory;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod naming;
pub mod provisioning;
pub mod subscription;

pub use client_factory::{AzureClientFactory, BatchEndpoint, ClientFactory};
pub use config::{ClientSettings, ProvisionConfig, ResolvedConfig};
pub use driver::{ProvisionReport, ProvisionStage, Provisioner};
pub use error::{ProvisionError, ProvisionResult};
