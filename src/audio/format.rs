// Stream format parameters and the byte arithmetic derived from them
//
// Every cursor and buffer size in the player is derived here, so the rest of
// the code never multiplies sample sizes by hand.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PlayerError, Result};

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_SAMPLE_SIZE: u16 = 2;
pub const DEFAULT_CHANNEL_COUNT: u16 = 2;
pub const DEFAULT_FRAMES_PER_PERIOD: u32 = 512;

/// Signed little-endian sample widths the player can stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    I8,
    I16,
    I32,
}

impl SampleKind {
    /// Map a sample size in bytes to a sample kind
    pub fn from_size(sample_size: u16) -> Option<Self> {
        match sample_size {
            1 => Some(Self::I8),
            2 => Some(Self::I16),
            4 => Some(Self::I32),
            _ => None,
        }
    }

    pub fn size(self) -> u16 {
        match self {
            Self::I8 => 1,
            Self::I16 => 2,
            Self::I32 => 4,
        }
    }
}

/// Fixed format of one playback session
///
/// The source carries no header, so these values are whatever the user says
/// the file contains. They never change while a stream is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamFormat {
    /// Frames per second
    pub sample_rate: u32,
    /// Bytes per sample
    pub sample_size: u16,
    /// Interleaved channels per frame
    pub channel_count: u16,
    /// Frames handed to the device per callback period
    pub frames_per_period: u32,
}

impl Default for StreamFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            sample_size: DEFAULT_SAMPLE_SIZE,
            channel_count: DEFAULT_CHANNEL_COUNT,
            frames_per_period: DEFAULT_FRAMES_PER_PERIOD,
        }
    }
}

impl StreamFormat {
    /// Build a format and reject it straight away if it cannot be streamed
    pub fn new(
        sample_rate: u32,
        sample_size: u16,
        channel_count: u16,
        frames_per_period: u32,
    ) -> Result<Self> {
        let format = Self {
            sample_rate,
            sample_size,
            channel_count,
            frames_per_period,
        };
        format.validate()?;
        Ok(format)
    }

    /// Check that every field is usable and the block size fits in `u32`
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(PlayerError::UnsupportedFormat(
                "sample rate must be greater than zero".to_string(),
            ));
        }
        if self.channel_count == 0 {
            return Err(PlayerError::UnsupportedFormat(
                "channel count must be greater than zero".to_string(),
            ));
        }
        if self.frames_per_period == 0 {
            return Err(PlayerError::UnsupportedFormat(
                "frames per period must be greater than zero".to_string(),
            ));
        }
        if SampleKind::from_size(self.sample_size).is_none() {
            return Err(PlayerError::UnsupportedFormat(format!(
                "sample size of {} bytes (expected 1, 2 or 4)",
                self.sample_size
            )));
        }
        if self.checked_block_bytes().is_none() {
            return Err(PlayerError::UnsupportedFormat(format!(
                "{} frames of {} bytes do not fit in one period",
                self.frames_per_period,
                self.frame_bytes()
            )));
        }
        Ok(())
    }

    /// Sample kind for the configured width (None if the width is unsupported)
    pub fn sample_kind(&self) -> Option<SampleKind> {
        SampleKind::from_size(self.sample_size)
    }

    /// Bytes in one frame (one sample per channel)
    pub fn frame_bytes(&self) -> u32 {
        self.sample_size as u32 * self.channel_count as u32
    }

    fn checked_block_bytes(&self) -> Option<u32> {
        self.frames_per_period.checked_mul(self.frame_bytes())
    }

    /// Bytes consumed by the producer on every period
    pub fn block_bytes(&self) -> u32 {
        self.checked_block_bytes().unwrap_or(u32::MAX)
    }

    /// Interleaved samples written to the device on every period
    pub fn samples_per_period(&self) -> usize {
        self.frames_per_period as usize * self.channel_count as usize
    }

    pub fn bytes_per_second(&self) -> u64 {
        self.sample_rate as u64 * self.frame_bytes() as u64
    }

    /// Signed byte distance covered by `seconds` of audio
    pub fn seconds_to_bytes(&self, seconds: i64) -> i64 {
        let per_second = i64::try_from(self.bytes_per_second()).unwrap_or(i64::MAX);
        seconds.saturating_mul(per_second)
    }

    pub fn bytes_to_seconds(&self, bytes: u64) -> f64 {
        bytes as f64 / self.bytes_per_second().max(1) as f64
    }

    /// Wall-clock length of one period, the audio callback's time budget
    pub fn period_duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames_per_period as f64 / self.sample_rate.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_matches_cd_audio() {
        let format = StreamFormat::default();
        assert!(format.validate().is_ok());
        assert_eq!(format.frame_bytes(), 4);
        assert_eq!(format.block_bytes(), 2048);
        assert_eq!(format.samples_per_period(), 1024);
        assert_eq!(format.bytes_per_second(), 176_400);
    }

    #[test]
    fn test_seconds_to_bytes_is_signed() {
        let format = StreamFormat::default();
        assert_eq!(format.seconds_to_bytes(5), 5 * 44100 * 2 * 2);
        assert_eq!(format.seconds_to_bytes(-5), -(5 * 44100 * 2 * 2));
        assert_eq!(format.seconds_to_bytes(i64::MAX), i64::MAX);
    }

    #[test]
    fn test_period_duration() {
        let format = StreamFormat::default();
        let ms = format.period_duration().as_secs_f64() * 1000.0;
        assert!((ms - 11.6).abs() < 0.1);
    }

    #[test]
    fn test_rejects_unsupported_sample_size() {
        let err = StreamFormat::new(44100, 3, 2, 512).unwrap_err();
        assert!(matches!(err, PlayerError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_rejects_zero_fields() {
        assert!(StreamFormat::new(0, 2, 2, 512).is_err());
        assert!(StreamFormat::new(44100, 2, 0, 512).is_err());
        assert!(StreamFormat::new(44100, 2, 2, 0).is_err());
    }

    #[test]
    fn test_rejects_block_overflow() {
        let err = StreamFormat::new(44100, 4, u16::MAX, u32::MAX / 2).unwrap_err();
        assert!(matches!(err, PlayerError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_sample_kind_sizes() {
        for kind in [SampleKind::I8, SampleKind::I16, SampleKind::I32] {
            assert_eq!(SampleKind::from_size(kind.size()), Some(kind));
        }
        assert_eq!(SampleKind::from_size(3), None);
    }
}
