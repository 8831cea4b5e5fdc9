// Error types shared by the player library

use thiserror::Error;

/// Errors that can stop a playback session
///
/// Every variant is fatal for the session. A short read at the end of the
/// source is not an error and never shows up here.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Source open/seek/read failed, or the terminal could not be driven
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested stream format is invalid or the device cannot render it
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The output device failed to open, start or keep running
    #[error("Audio device error: {0}")]
    Device(String),

    /// Settings file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;
