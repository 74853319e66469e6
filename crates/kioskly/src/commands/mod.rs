//! Command dispatch: bridges CLI args -> core types -> output formatting.

pub mod catalog;
pub mod check;
pub mod config_cmd;
pub mod exec;
pub mod screenshot;
pub mod status;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;

/// Dispatch a device-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => status::handle(args, global, cfg).await,
        Command::Check => check::handle(global, cfg).await,
        Command::Screenshot(args) => screenshot::handle(args, global, cfg).await,
        Command::Exec(args) => exec::handle(args, global, cfg).await,
        Command::Watch(args) => watch::handle(args, global, cfg).await,
        // Commands, Config and Completions are handled before dispatch
        Command::Commands | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Resolve the selected device and build its transport client.
fn connect(
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(config::SelectedDevice, kioskly_core::KioskClient), CliError> {
    let device = config::select_device(global, cfg)?;
    let client = device.config.build_client()?;
    tracing::debug!(device = %device.name, url = %client.base_url(), "device selected");
    Ok((device, client))
}
