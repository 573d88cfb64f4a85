//! unxrandr - print a command that recreates the current output layout

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::io::Write;
use unxrandr_core::logging::init_logging;
use unxrandr_core::{read_snapshot_from, AppConfig, Serializer};

#[derive(Parser)]
#[command(
    name = "unxrandr",
    version,
    about = "Print an xrandr (or swaymsg) command that recreates the current output layout"
)]
struct Cli {}

fn main() {
    let _cli = Cli::parse();

    if let Err(e) = run() {
        eprintln!("unxrandr: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    let _logger = init_logging(&config.logging).context("initializing logging")?;
    debug!("Configuration: {:?}", config);

    let backend = config.query.resolve_backend();
    let snapshot = read_snapshot_from(backend, &config.query)?;

    let target = config.output.target.resolve(backend);
    let command = Serializer::new(target).serialize(snapshot);
    if !command.losses().is_empty() {
        info!(
            "{} attribute(s) could not be expressed for {}",
            command.losses().len(),
            target
        );
    }

    let mut text = command.render(config.output.format);
    if !text.ends_with('\n') {
        text.push('\n');
    }
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .context("writing command to stdout")?;
    Ok(())
}
