mod cli;
mod commands;
mod error;
mod output;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lsync_api::{CancellationToken, TransportConfig};
use lsync_config::{Overrides, Settings};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let overrides = Overrides {
        org: cli.global.org.clone(),
        env: cli.global.environment.clone(),
        api_base_url: cli.global.api_base_url.clone(),
    };
    let settings = Settings::load(&overrides)?;
    let transport = TransportConfig {
        timeout: Duration::from_secs(cli.global.timeout),
        ..TransportConfig::default()
    };
    let client = Arc::new(settings.build_client(transport)?);

    // Ctrl-C cancels in-flight requests, including backoff sleeps.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let org = client.org_name().to_owned();
    tracing::debug!(command = ?cli.command, %org, "dispatching command");
    commands::dispatch(cli.command, client, &cancel, &cli.global)
        .await
        .map_err(|err| err.with_org(&org))
}
