//! # Batch Provision CLI
//!
//! `batch-provision <configfile>`: provision a batch account, container pool, job
//! and task from a JSON configuration file.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;

use batch_provision::auth::{CachingCredential, DefaultCredential, TokenCredential};
use batch_provision::client_factory::AzureClientFactory;
use batch_provision::config::{ClientSettings, ProvisionConfig};
use batch_provision::driver::{stopped_at, ProvisionStage, Provisioner};
use batch_provision::error::ProvisionError;
use batch_provision::logging::{init_structured_logging, log_error};
use batch_provision::provisioning::RegistryCredentials;

const USAGE: &str = "Usage: batch-provision <configfile>";

#[derive(Parser, Debug)]
#[command(name = "batch-provision")]
#[command(about = "Provision an Azure Batch account, container pool, job and task")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// JSON configuration file
    #[arg(value_name = "CONFIGFILE")]
    config_file: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            let err = ProvisionError::Usage(USAGE.to_string()).at_stage(ProvisionStage::ParseArgs);
            println!("{}", err.root());
            return ExitCode::FAILURE;
        }
    };

    init_structured_logging();
    info!(config_file = %cli.config_file.display(), "batch-provision starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ProvisionConfig::load_from_file(&cli.config_file)
        .map_err(|e| e.at_stage(ProvisionStage::LoadConfig))?;

    let settings = ClientSettings::load();
    let credential: Arc<dyn TokenCredential> = Arc::new(CachingCredential::new(
        DefaultCredential::new(&settings)
            .map_err(|e| e.at_stage(ProvisionStage::ResolveCredentials))?,
    ));
    let factory = AzureClientFactory::new(credential, settings.clone());

    let result = Provisioner::new(factory, settings.poll_interval())
        .run(config, RegistryCredentials::from_env())
        .await;
    info!(stage = %stopped_at(&result), "batch-provision finished");

    let report = result?;
    println!("{report}");
    Ok(())
}

fn report_failure(err: &anyhow::Error) {
    if let Some(provision_error) = err.downcast_ref::<ProvisionError>() {
        if let ProvisionError::MissingConfigKeys { keys } = provision_error.root() {
            for key in keys {
                println!("Missing key in config file: {key}");
            }
        }

        let stage = provision_error
            .stage()
            .map_or_else(|| "startup".to_string(), |stage| stage.to_string());
        let origin = if provision_error.is_configuration_error() {
            "configuration"
        } else {
            "cloud"
        };
        log_error(
            "batch-provision",
            &stage,
            &provision_error.root().to_string(),
            Some(origin),
        );
    }

    eprintln!("Error: {err:#}");
}
