//! `kioskly screenshot`: fetch the current screen image.

use std::io::Write;

use crate::cli::{GlobalOpts, ScreenshotArgs};
use crate::config::Config;
use crate::error::CliError;

pub async fn handle(args: ScreenshotArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let (_, client) = super::connect(global, cfg)?;
    let image = client
        .get_screenshot()
        .await
        .map_err(kioskly_core::CoreError::from)?;

    match args.file {
        Some(path) => {
            std::fs::write(&path, &image)?;
            if !global.quiet {
                eprintln!("Saved {} bytes to {}", image.len(), path.display());
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&image)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
