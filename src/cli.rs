// Command line flags
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use binplay_lib::PlayerSettings;

/// Play raw interleaved PCM files in the terminal
#[derive(Parser, Debug)]
#[command(name = "binplay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Raw PCM file to play (no header, little-endian signed samples)
    pub filename: PathBuf,

    /// Number of frames to handle per buffer
    #[arg(short = 'f', long)]
    pub frames_per_buffer: Option<u32>,

    /// Size of each sample in bytes (1, 2 or 4)
    #[arg(short = 's', long)]
    pub sample_size: Option<u16>,

    /// How many audio channels to use
    #[arg(short = 'c', long)]
    pub channel_count: Option<u16>,

    /// Number of frames per second
    #[arg(short = 'r', long)]
    pub sample_rate: Option<u32>,

    /// Startup volume (0.0 to 1.0)
    #[arg(short = 'v', long)]
    pub volume: Option<f32>,

    /// Seconds skipped by the left/right arrow keys
    #[arg(long)]
    pub seek_seconds: Option<u32>,

    /// Stop at the end of the file instead of looping
    #[arg(long)]
    pub no_loop: bool,

    /// Open the file paused
    #[arg(long)]
    pub paused: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective settings to this file before playing
    #[arg(long)]
    pub save_config: Option<PathBuf>,

    /// Print status as JSON lines instead of drawing the screen
    #[arg(long)]
    pub status_json: bool,

    /// More log output on stderr (repeat for more)
    #[arg(long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Settings from the config file with flags layered on top
    pub fn settings(&self) -> Result<PlayerSettings> {
        let mut settings = match self.config.clone().or_else(PlayerSettings::default_path) {
            Some(path) => PlayerSettings::load(&path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => PlayerSettings::default(),
        };

        let format = &mut settings.format;
        if let Some(frames) = self.frames_per_buffer {
            format.frames_per_period = frames;
        }
        if let Some(size) = self.sample_size {
            format.sample_size = size;
        }
        if let Some(channels) = self.channel_count {
            format.channel_count = channels;
        }
        if let Some(rate) = self.sample_rate {
            format.sample_rate = rate;
        }

        if let Some(volume) = self.volume {
            settings.playback.volume = volume;
        }
        if self.no_loop {
            settings.playback.loop_after_complete = false;
        }
        if self.paused {
            settings.playback.start_paused = true;
        }
        if let Some(seconds) = self.seek_seconds {
            settings.control.seek_seconds = seconds;
        }
        Ok(settings)
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
