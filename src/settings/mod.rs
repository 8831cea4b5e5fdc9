// Settings module
// JSON settings file with defaults, overridden by command line flags

mod settings;

pub use settings::{ControlSettings, PlaybackSettings, PlayerSettings};
