// binplay - raw PCM file player
// Module declarations
pub mod audio;
pub mod control;
pub mod error;
pub mod session;
pub mod settings;
pub mod status;

pub use control::Command;
pub use error::{PlayerError, Result};
pub use session::{ControlSurface, Session};
pub use settings::PlayerSettings;
pub use status::Status;
