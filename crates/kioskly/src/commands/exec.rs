//! `kioskly exec`: send one registered command to the selected device.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use kioskly_core::command::parse_parameter;
use kioskly_core::{CommandCall, CommandDispatcher, CommandRegistry, DeviceHub, Target};

use crate::cli::{ExecArgs, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ExecResult<'a> {
    command: &'a str,
    device: &'a str,
    ok: bool,
}

pub async fn handle(args: ExecArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let mut call = CommandCall::default();
    for raw in &args.params {
        let (key, value) = parse_parameter(raw)?;
        call.parameters.insert(key, value);
    }

    let mut device = config::select_device(global, cfg)?;
    // One-shot: no periodic polling behind the command.
    device.config.poll_interval = Duration::ZERO;

    let mut hub = DeviceHub::new();
    let entry = hub.add(&device.config)?;
    call.target = Target::entry(entry.id());

    let dispatcher = CommandDispatcher::new(Arc::new(hub), Arc::new(CommandRegistry::new()));
    // Reject unknown commands before touching the network.
    if dispatcher.registry().get(&args.name).is_none() {
        return Err(CliError::UnknownCommand { name: args.name });
    }

    if let Err(e) = entry.start().await {
        dispatcher.hub().shutdown_all().await;
        return Err(e.into());
    }
    let result = dispatcher.execute(&args.name, call).await;
    dispatcher.hub().shutdown_all().await;
    result?;

    let out = output::render_single(
        config::output_format(global, cfg),
        &ExecResult {
            command: &args.name,
            device: &device.name,
            ok: true,
        },
        |r| format!("Sent {} to {}", r.command, r.device),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
