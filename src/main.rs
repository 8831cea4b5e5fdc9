// binplay - play raw PCM files from the terminal
mod cli;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use binplay_lib::Session;
use cli::Cli;
use terminal::TerminalSurface;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; keep them quiet by default so the status screen stays readable
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_filter())).init();
    info!("binplay v{}", env!("CARGO_PKG_VERSION"));

    let settings = cli.settings()?;
    if let Some(path) = &cli.save_config {
        settings
            .save(path)
            .with_context(|| format!("Failed to save settings to {}", path.display()))?;
    }

    let mut session = Session::open(&cli.filename, &settings)
        .with_context(|| format!("Failed to open '{}'", cli.filename.display()))?;

    let mut surface = TerminalSurface::new(&settings, cli.status_json);
    let result = session.run(&mut surface);

    // Stream first, then the terminal, then report
    session.close();
    drop(surface);
    result.context("Playback stopped")
}
