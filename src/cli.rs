//! Command-line front-end over the certificate views.
//!
//! Usage:
//!   devportal-mtls --application <id> list
//!   devportal-mtls --application <id> --key-type SANDBOX add --name edge --file edge.pem
//!   devportal-mtls --application <id> --demo delete <uuid>

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use log::info;

use crate::certificates::{
    ActionOutcome, CertificateList, CertificateManager, DialogView, ListView, ManagerView,
    UploadForm,
};
use crate::config::PortalConfig;
use crate::core::types::KeyType;
use crate::notify::LogNotifier;
use crate::portal::{DevPortalApi, InMemoryPortal, RestPortalClient};

#[derive(Debug, Parser)]
#[command(
    name = "devportal-mtls",
    about = "Manage mutual-TLS client certificates of a developer portal application"
)]
pub struct Cli {
    /// Application the certificates are attached to.
    #[arg(short, long)]
    pub application: String,

    /// Key type (environment) to operate on.
    #[arg(short, long, default_value = KeyType::PRODUCTION)]
    pub key_type: String,

    /// Use a seeded in-memory portal instead of the configured one.
    #[arg(long)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List certificates of the selected key type.
    List,
    /// Show status and subject of one certificate.
    Show { uuid: String },
    /// Upload a PEM certificate.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a certificate.
    Delete { uuid: String },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    crate::init_logging();
    execute(cli, PortalConfig::from_env())
}

pub fn execute(cli: Cli, config: PortalConfig) -> Result<()> {
    let api: Arc<dyn DevPortalApi> = if cli.demo {
        let portal = InMemoryPortal::new();
        portal.seed_demo_certificates(&cli.application)?;
        Arc::new(portal)
    } else {
        Arc::new(
            RestPortalClient::from_config(&config)
                .context("failed to create developer portal client")?,
        )
    };

    let mut manager = CertificateManager::new(
        cli.application.clone(),
        KeyType::new(cli.key_type.clone()),
        api,
        Arc::new(LogNotifier),
        config.failure_policy,
    );
    manager.load()?;
    let list = match manager.render() {
        ManagerView::Certificates { list, .. } => list.clone(),
        ManagerView::Failed { message } => bail!("{message}"),
        ManagerView::Loading => bail!("certificates are still loading"),
    };

    match cli.command {
        Command::List => print_list(&list),
        Command::Show { uuid } => {
            let name = name_of(&list, &uuid)?;
            expect_completed(list.show_details(&name, &uuid)?, "show")?;
            if let DialogView::Details { title, lines } = list.render_dialog()? {
                println!("{title}");
                for line in lines {
                    println!("  {line}");
                }
            }
            list.close_details()
        }
        Command::Add { name, file } => {
            let form = UploadForm::from_file(name, &file)?;
            list.open_upload()?;
            let outcome = list.upload(&form)?;
            if outcome != ActionOutcome::Completed {
                list.close_upload()?;
            }
            expect_completed(outcome, "add")?;
            print_list(&list)
        }
        Command::Delete { uuid } => {
            let name = name_of(&list, &uuid)?;
            list.request_delete(&uuid, &name)?;
            expect_completed(list.confirm_delete()?, "delete")?;
            info!("[cli] deleted {name}");
            print_list(&list)
        }
    }
}

fn name_of(list: &CertificateList, uuid: &str) -> Result<String> {
    list.certificates()?
        .into_iter()
        .find(|cert| cert.uuid == uuid)
        .map(|cert| cert.name)
        .ok_or_else(|| anyhow!("no {} certificate with UUID {uuid}", list.key_type()))
}

fn expect_completed(outcome: ActionOutcome, action: &str) -> Result<()> {
    match outcome {
        ActionOutcome::Completed => Ok(()),
        other => Err(anyhow!("{action} did not complete: {other:?}")),
    }
}

fn print_list(list: &CertificateList) -> Result<()> {
    match list.render()? {
        ListView::Empty { placeholder } => println!("{placeholder}"),
        ListView::Rows(rows) => {
            for row in rows {
                println!("{}\t{}", row.uuid, row.name);
            }
        }
    }
    Ok(())
}
