//! `kioskly check`: verify the device answers its health check.

use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct CheckResult<'a> {
    device: &'a str,
    url: &'a str,
    ok: bool,
}

pub async fn handle(global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let (device, client) = super::connect(global, cfg)?;
    client.check_connection().await.map_err(kioskly_core::CoreError::from)?;

    let result = CheckResult {
        device: &device.name,
        url: client.base_url(),
        ok: true,
    };
    let out = output::render_single(config::output_format(global, cfg), &result, |r| {
        format!("{} ({}) is reachable", r.device, r.url)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
