//! # stepwise: desktop automation runner
//!
//! Composition root that wires the adapters together and exposes the
//! command line.
//!
//! ## Responsibilities
//! - Parse configuration (CLI args, env vars, config file)
//! - Initialise logging
//! - Construct the file repository and the virtual input backend (adapters)
//! - Construct application services, injecting adapters via port traits
//! - Cancel a running automation on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use stepwise_adapter_storage_fs::FsAutomationRepository;
use stepwise_adapter_virtual::{Screen, VirtualBackend};
use stepwise_app::services::{AutomationService, EditorSession};
use stepwise_domain::document::AutomationDocument;
use stepwise_domain::variable::VariableFilter;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "stepwise", version, about = "Run and inspect desktop automations")]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true, default_value = config::DEFAULT_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run an automation against the virtual backend and print what it sent.
    Run {
        /// Path to an automation file, or the name of a stored automation.
        file: PathBuf,
        /// Delay before every step, in milliseconds. Overrides the config.
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Validate an automation file without running it.
    Check {
        /// Path to an automation file, or the name of a stored automation.
        file: PathBuf,
    },
    /// List stored automations.
    List,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("cannot load configuration from {}", cli.config.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|err| {
            eprintln!("invalid log filter {:?}: {err}", config.logging.filter);
            EnvFilter::new("info")
        }))
        .with_writer(std::io::stderr)
        .init();

    let service = AutomationService::new(FsAutomationRepository::new(
        &config.storage.automations_dir,
    ));

    match cli.command {
        Command::Run { file, delay_ms } => {
            let document = load(&service, &file).await?;
            run(&config, document, delay_ms).await
        }
        Command::Check { file } => {
            let document = load(&service, &file).await?;
            println!(
                "ok: {:?} ({} steps, {} variables)",
                document.meta.title,
                document.data.steps.iter().count(),
                document.data.variables.len()
            );
            Ok(())
        }
        Command::List => {
            for stored in service.list().await? {
                println!(
                    "{}\t{}\t{}",
                    stored.file_name,
                    stored.meta.title,
                    stored.meta.created_at.to_rfc3339()
                );
            }
            Ok(())
        }
    }
}

/// Read `file` from disk, or from the automation store when no such path
/// exists.
async fn load(
    service: &AutomationService<FsAutomationRepository>,
    file: &Path,
) -> anyhow::Result<AutomationDocument> {
    if tokio::fs::try_exists(file).await.unwrap_or(false) {
        let raw = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("cannot read {}", file.display()))?;
        return AutomationDocument::try_parse(&raw)
            .with_context(|| format!("cannot load automation {}", file.display()));
    }
    let name = file.to_string_lossy();
    service
        .load(&name)
        .await
        .with_context(|| format!("cannot load automation {name}"))
}

async fn run(config: &Config, document: AutomationDocument, delay_ms: Option<u64>) -> anyhow::Result<()> {
    let delay = delay_ms.map_or_else(|| config.step_delay(), std::time::Duration::from_millis);
    let backend = VirtualBackend::new(Screen {
        width: config.screen.width,
        height: config.screen.height,
    });
    tracing::info!(title = %document.meta.title, ?delay, "running automation");
    let session = EditorSession::from_document(backend, document);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling run");
            on_ctrl_c.cancel();
        }
    });

    let result = session.run(delay, cancel).await;

    for (index, dispatch) in session.backend().dispatches().iter().enumerate() {
        println!("{:>4}  {dispatch}", index + 1);
    }
    let env = match result {
        Ok(env) => env,
        Err(err) => {
            let position = err
                .step()
                .map(|step| session.steps().position_path(step))
                .filter(|path| !path.is_empty());
            return Err(match position {
                Some(position) => anyhow::Error::new(err).context(format!("step {position} failed")),
                None => anyhow::Error::new(err),
            });
        }
    };

    for (name, variable) in env.entries(VariableFilter::default()) {
        tracing::debug!(name, value = ?variable.value, "final variable");
    }
    Ok(())
}
