use lsync_api::{CancellationToken, Client};

use crate::cli::{GlobalOpts, ResolveArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    client: &Client,
    cancel: &CancellationToken,
    args: ResolveArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let rendered = if args.id_only {
        client.get_by_link(cancel, &args.url).await?
    } else {
        let resource = client.get_linked(cancel, &args.url).await?;
        output::render(global.output, &resource)?
    };

    output::print_output(&rendered);
    Ok(())
}
