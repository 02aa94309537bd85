//! get / create / update / delete / import for any resource kind.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use lsync_api::{CancellationToken, Client};
use lsync_core::{Reconciler, ResourceKind, Tracked};

use super::read_definition;
use crate::cli::{GlobalOpts, ResourceCommand};
use crate::error::CliError;
use crate::output;

pub async fn handle<K: ResourceKind>(
    client: Arc<Client>,
    cancel: &CancellationToken,
    command: ResourceCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let reconciler = Reconciler::<K>::new(client);

    let rendered = match command {
        ResourceCommand::Get { project, id } => {
            let tracked = reconciler.get(cancel, project, id).await?;
            output::render(global.output, &tracked)?
        }

        ResourceCommand::Create { project, file } => {
            let mut tracked = Tracked::new(project, read_definition::<K::Attrs>(&file)?);
            reconciler.create(cancel, &mut tracked).await?;
            info!(kind = K::NAME, id = tracked.id(), "created");
            output::render(global.output, &tracked)?
        }

        ResourceCommand::Update { project, id, file } => {
            let mut tracked = Tracked::existing(project, id, read_definition::<K::Attrs>(&file)?);
            reconciler.update(cancel, &mut tracked).await?;
            output::render(global.output, &tracked)?
        }

        ResourceCommand::Delete { project, id } => {
            reconciler.delete_id(cancel, &project, &id).await?;
            info!(kind = K::NAME, %project, %id, "deleted");
            output::render(
                global.output,
                &json!({ "project": project, "presence": { "state": "deleted", "id": id } }),
            )?
        }

        ResourceCommand::Import { reference } => {
            let tracked = reconciler.import(cancel, &reference).await?;
            output::render(global.output, &tracked)?
        }
    };

    output::print_output(&rendered);
    Ok(())
}
