// Settings management and persistence
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::format::StreamFormat;
use crate::error::{PlayerError, Result};

/// Playback settings applied when a session opens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub volume: f32, // Startup gain, 0.0-1.0
    pub loop_after_complete: bool,
    pub start_paused: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            loop_after_complete: true,
            start_paused: false,
        }
    }
}

/// Step sizes for the control keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub seek_seconds: u32,
    pub gain_step: f32,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            seek_seconds: 5,
            gain_step: 0.05,
        }
    }
}

/// Main player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub version: i32, // Settings schema version for future migrations
    pub format: StreamFormat,
    pub playback: PlaybackSettings,
    pub control: ControlSettings,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: 1,
            format: StreamFormat::default(),
            playback: PlaybackSettings::default(),
            control: ControlSettings::default(),
        }
    }
}

impl PlayerSettings {
    /// Default settings file location in the user's config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("binplay").join("settings.json"))
    }

    /// Load settings from file, or return defaults if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("[Settings] No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| PlayerError::Config(format!("Failed to read {:?}: {}", path, e)))?;

        let settings: PlayerSettings = serde_json::from_str(&content)
            .map_err(|e| PlayerError::Config(format!("Failed to parse {:?}: {}", path, e)))?;

        info!("[Settings] Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PlayerError::Config(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PlayerError::Config(format!("Failed to serialize settings: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| PlayerError::Config(format!("Failed to write {:?}: {}", path, e)))?;

        info!("[Settings] Saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PlayerSettings::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, PlayerSettings::default());
        assert!(settings.playback.loop_after_complete);
        assert_eq!(settings.control.seek_seconds, 5);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = PlayerSettings::default();
        settings.format.sample_rate = 48000;
        settings.format.frames_per_period = 256;
        settings.playback.volume = 0.4;
        settings.save(&path).unwrap();

        let loaded = PlayerSettings::load(&path).unwrap();
        assert_eq!(loaded.format.sample_rate, 48000);
        assert_eq!(loaded.format.frames_per_period, 256);
        assert_relative_eq!(loaded.playback.volume, 0.4);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let content = r#"{ "format": { "channel_count": 1 }, "control": { "seek_seconds": 30 } }"#;
        fs::write(&path, content).unwrap();

        let settings = PlayerSettings::load(&path).unwrap();
        assert_eq!(settings.format.channel_count, 1);
        assert_eq!(settings.format.sample_rate, 44100);
        assert_eq!(settings.control.seek_seconds, 30);
        assert_relative_eq!(settings.control.gain_step, 0.05);
        assert_eq!(settings.version, 1);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let err = PlayerSettings::load(&path).unwrap_err();
        assert!(matches!(err, PlayerError::Config(_)));
    }
}
