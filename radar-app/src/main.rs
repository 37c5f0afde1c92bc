use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use radar_common::observability::{LogConfig, LogFormat, init_logging};
use radar_config::{RadarConfigLoader, default_config_path};
use radar_runtime::RadarRuntime;

use cli::Cli;
mod cli;
mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Logging first so config problems land in the log too
    let log_path = init_logging(LogConfig {
        log_dir: cli.log_dir.clone(),
        emit_stderr: cli.stderr,
        format: if cli.log_json { LogFormat::Json } else { LogFormat::Text },
        ..LogConfig::default()
    })?;

    // 2) Settings (env wins over the file)
    let mut loader = RadarConfigLoader::new();
    match cli.config.as_ref() {
        Some(path) => loader = loader.with_file(path),
        None => {
            if let Some(path) = default_config_path() {
                loader = loader.with_optional_file(path);
            }
        }
    }
    let settings = loader.load().context("loading radar settings")?;
    tracing::info!(log = %log_path.display(), command = ?cli.command, "radar.start");

    // 3) Runtime with Ctrl-C wired to the shared token
    let runtime = RadarRuntime::build("radar-worker", cli.workers)?;
    runtime.cancel_on_ctrl_c();
    let cancel = runtime.handle().child_token();

    let result = runtime.block_on(commands::run(cli.command, settings, cancel));
    runtime.shutdown(Duration::from_secs(2));
    result
}
