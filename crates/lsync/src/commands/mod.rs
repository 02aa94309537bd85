//! Command dispatch: bridges CLI args -> reconcilers -> output formatting.

pub mod resolve;
pub mod resource;

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use lsync_api::{CancellationToken, Client};
use lsync_core::{AlertKind, DashboardKind, MetricConditionKind, StreamKind};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(
    cmd: Command,
    client: Arc<Client>,
    cancel: &CancellationToken,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Stream(args) => {
            resource::handle::<StreamKind>(client, cancel, args.command, global).await
        }
        Command::Dashboard(args) => {
            resource::handle::<DashboardKind>(client, cancel, args.command, global).await
        }
        Command::Alert(args) => {
            resource::handle::<AlertKind>(client, cancel, args.command, global).await
        }
        Command::MetricCondition(args) => {
            resource::handle::<MetricConditionKind>(client, cancel, args.command, global).await
        }
        Command::Resolve(args) => resolve::handle(&client, cancel, args, global).await,
    }
}

/// Load a declared-attributes JSON file.
pub fn read_definition<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Json {
        path: path.to_owned(),
        source,
    })
}
