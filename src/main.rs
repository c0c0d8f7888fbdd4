//! Fermenator — fermentation-control supervisor, CLI entry point.
#![deny(unused_must_use)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use fermenator::config::bootstrap::{BootstrapDoc, BootstrapStore, Credentials};
use fermenator::config::store::{ConfigStore, InlineConfigStore, RemoteKvStore, TabularSheetStore};
use fermenator::error::ConfigError;
use fermenator::supervisor::Supervisor;

#[derive(Parser)]
#[command(name = "fermenator", version, about = "Fermentation-control supervisor")]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mirror logs to this file in addition to stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble the object graph and run until interrupted.
    Run {
        /// Bootstrap descriptor path, overriding the standard search order.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Credentials file path, overriding the standard search order.
        #[arg(long)]
        credentials: Option<PathBuf>,
    },
    /// Build just the Relay set from the resolved config and force every
    /// relay off, then exit. Meant to override default-high pins at boot,
    /// before anything is reading sensors or making decisions.
    Init {
        /// Bootstrap descriptor path, overriding the standard search order.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Credentials file path, overriding the standard search order.
        #[arg(long)]
        credentials: Option<PathBuf>,
    },
}

fn init_logging(verbosity: u8, log_file: Option<&PathBuf>) -> Result<()> {
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn build_store(doc: BootstrapDoc, credentials: Credentials) -> ConfigStore {
    match doc.store {
        BootstrapStore::Inline { spec } => {
            let spec = serde_json::from_value(spec).expect("inline spec already validated at parse time");
            ConfigStore::Inline(InlineConfigStore::new(spec, Duration::from_secs(60), doc.datastore))
        }
        BootstrapStore::TabularSheet {
            sheet_id,
            refresh_interval_secs,
        } => {
            let token = credentials.get("sheets_token").map(str::to_string);
            ConfigStore::TabularSheet(TabularSheetStore::new(
                fermenator::config::store_backends::google_sheets(sheet_id, token),
                Duration::from_secs(refresh_interval_secs),
                doc.datastore,
            ))
        }
        BootstrapStore::RemoteKv {
            base_url,
            root,
            refresh_interval_secs,
        } => {
            let token = credentials.get("kv_token").map(str::to_string);
            ConfigStore::RemoteKV(RemoteKvStore::new(
                fermenator::config::store_backends::remote_kv(base_url, token),
                root,
                Duration::from_secs(refresh_interval_secs),
                doc.datastore,
            ))
        }
    }
}

fn load_store(config: Option<PathBuf>, credentials: Option<PathBuf>) -> Result<ConfigStore, ExitCode> {
    let doc = BootstrapDoc::load(config.as_deref()).map_err(|e| {
        error!("{e}");
        exit_code_for_config_error(&e)
    })?;
    let creds = Credentials::load(credentials.as_deref()).map_err(|e| {
        error!("{e}");
        exit_code_for_config_error(&e)
    })?;
    Ok(build_store(doc, creds))
}

async fn run(config: Option<PathBuf>, credentials: Option<PathBuf>) -> Result<ExitCode> {
    let store = match load_store(config, credentials) {
        Ok(s) => s,
        Err(code) => return Ok(code),
    };
    let supervisor = Supervisor::new(store);
    if let Err(e) = supervisor.assemble().await {
        error!("assemble failed: {e}");
        return Ok(ExitCode::from(1));
    }

    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);

    info!("fermenator running, press Ctrl-C to stop");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received interrupt, shutting down");
        }
        () = supervisor.run_refresh_loop(stop_rx.clone()) => {}
    }
    let _ = stop_tx.send(true);
    supervisor.disassemble().await;
    Ok(ExitCode::from(130))
}

fn exit_code_for_config_error(e: &ConfigError) -> ExitCode {
    match e {
        ConfigError::Invalid(_) | ConfigError::ReferentialIntegrity(_) => ExitCode::from(1),
        ConfigError::Io(_) | ConfigError::Parse(_) => ExitCode::from(2),
    }
}

async fn init(config: Option<PathBuf>, credentials: Option<PathBuf>) -> Result<ExitCode> {
    let store = match load_store(config, credentials) {
        Ok(s) => s,
        Err(code) => return Ok(code),
    };
    let spec = match store.load().await {
        Ok(spec) => spec,
        Err(e) => {
            error!("loading config failed: {e}");
            return Ok(exit_code_for_config_error(&e));
        }
    };

    for (name, component) in &spec.relays {
        let relay = match fermenator::supervisor::build_relay(name, component) {
            Ok(r) => r,
            Err(e) => {
                error!("relay `{name}`: {e}");
                return Ok(ExitCode::from(1));
            }
        };
        relay.shutdown().await;
        info!("relay `{name}` commanded off");
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_ref())?;

    info!("fermenator v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Run { config, credentials } => run(config, credentials).await,
        Command::Init { config, credentials } => init(config, credentials).await,
    }
}
