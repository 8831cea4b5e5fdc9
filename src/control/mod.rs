// Transport commands and how they are applied
//
// Front ends (terminal keys, anything else) only ever produce `Command`s; the
// mapping from raw input lives with each front end.

pub mod keys;

use log::debug;

use crate::audio::format::StreamFormat;
use crate::audio::transport::TransportState;

/// Closed set of transport commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    TogglePlay,
    ToggleLoop,
    SeekToStart,
    SeekToEnd,
    /// Jump by whole seconds, negative is backwards
    SeekRelative { seconds: i64 },
    SeekAbsolute { byte_offset: i64 },
    /// Change the gain by a signed amount
    AdjustGain(f32),
    Exit,
}

/// What the control loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Apply one command to the transport
///
/// Only touches atomics, never blocks, allocates or performs I/O.
pub fn apply_command(state: &TransportState, format: &StreamFormat, command: Command) -> Flow {
    match command {
        Command::TogglePlay => state.toggle_play(),
        Command::ToggleLoop => state.toggle_loop(),
        Command::SeekToStart => state.seek_to_start(),
        Command::SeekToEnd => state.seek_to_end(),
        Command::SeekRelative { seconds } => {
            state.seek_relative(format.seconds_to_bytes(seconds))
        }
        Command::SeekAbsolute { byte_offset } => state.seek_absolute(byte_offset),
        Command::AdjustGain(delta) => state.adjust_gain(delta),
        Command::Exit => return Flow::Exit,
    }
    debug!("Applied {:?}", command);
    Flow::Continue
}
