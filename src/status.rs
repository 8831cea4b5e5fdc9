// Read-only status snapshot for presentation layers

use serde::Serialize;
use std::fmt;

use crate::audio::format::StreamFormat;
use crate::audio::transport::TransportState;

/// Point-in-time copy of the transport and format
///
/// Taking one only loads atomics, so it never disturbs the audio thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub file: String,
    pub cursor_bytes: i64,
    pub source_length_bytes: u64,
    pub is_playing: bool,
    pub loop_enabled: bool,
    pub gain: f32,
    pub sample_rate: u32,
    pub sample_size: u16,
    pub channel_count: u16,
    pub frames_per_period: u32,
}

impl Status {
    pub fn capture(file: &str, state: &TransportState, format: &StreamFormat) -> Self {
        let snapshot = state.snapshot();
        Self {
            file: file.to_string(),
            cursor_bytes: snapshot.cursor,
            source_length_bytes: state.source_length(),
            is_playing: snapshot.playing,
            loop_enabled: snapshot.loop_enabled,
            gain: snapshot.gain,
            sample_rate: format.sample_rate,
            sample_size: format.sample_size,
            channel_count: format.channel_count,
            frames_per_period: format.frames_per_period,
        }
    }

    fn format(&self) -> StreamFormat {
        StreamFormat {
            sample_rate: self.sample_rate,
            sample_size: self.sample_size,
            channel_count: self.channel_count,
            frames_per_period: self.frames_per_period,
        }
    }

    /// Cursor position as a whole percentage of the source
    pub fn progress_percent(&self) -> u32 {
        if self.source_length_bytes == 0 {
            return 0;
        }
        (100.0 * self.cursor_bytes.max(0) as f64 / self.source_length_bytes as f64) as u32
    }

    pub fn position_secs(&self) -> f64 {
        self.format().bytes_to_seconds(self.cursor_bytes.max(0) as u64)
    }

    pub fn duration_secs(&self) -> f64 {
        self.format().bytes_to_seconds(self.source_length_bytes)
    }
}

fn clock(seconds: f64) -> String {
    let total = seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paused = if self.is_playing { "" } else { "[paused]" };
        let looping = if self.loop_enabled { "[looping]" } else { "" };

        writeln!(f, "Currently playing: {} {}", self.file, paused)?;
        writeln!(
            f,
            "Cursor: [{}/{}] ({}%) {}",
            self.cursor_bytes,
            self.source_length_bytes,
            self.progress_percent(),
            looping
        )?;
        writeln!(
            f,
            "Time: {} / {}",
            clock(self.position_secs()),
            clock(self.duration_secs())
        )?;
        writeln!(f)?;
        writeln!(f, "Volume: {}%", (100.0 * self.gain).round() as i32)?;
        writeln!(f, "Channel count: {}", self.channel_count)?;
        writeln!(f, "Sample rate: {}", self.sample_rate)?;
        writeln!(f, "Sample size: {}", self.sample_size)?;
        write!(f, "Frames per buffer: {}", self.frames_per_period)
    }
}
