// Terminal key decoding
//
// Bytes from a raw-mode terminal come in one at a time; arrow keys arrive as
// `ESC [ A..D` and may be split across reads.

use super::Command;

const CTRL_C: u8 = 3;
const CTRL_D: u8 = 4;
const TAB: u8 = b'\t';
const ESC: u8 = 27;

/// Input understood by the terminal front end
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Command(Command),
    /// Presentation only, never reaches the transport
    ToggleHelp,
}

/// Help lines shown by the front end
pub const KEY_HELP: &[&str] = &[
    " KEY          DESCRIPTION",
    " [^D] [Q]   - exit (^C too)",
    " [E]        - go to the (e)nd",
    " [R]        - go to the start and (r)eset",
    " [L]        - toggle (l)oop",
    " [SPACEBAR] - toggle pause",
    " [LEFT]     - seek backwards",
    " [RIGHT]    - seek forwards",
    " [UP]       - volume up",
    " [DOWN]     - volume down",
    " [TAB]      - toggle help menu",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Ground,
    Escape,
    Csi,
}

pub struct KeyDecoder {
    seek_seconds: i64,
    gain_step: f32,
    state: DecodeState,
}

impl KeyDecoder {
    pub fn new(seek_seconds: u32, gain_step: f32) -> Self {
        Self {
            seek_seconds: seek_seconds as i64,
            gain_step,
            state: DecodeState::Ground,
        }
    }

    /// Feed one byte; returns an input once a whole key has been seen
    pub fn feed(&mut self, byte: u8) -> Option<Input> {
        match self.state {
            DecodeState::Ground => self.ground(byte),
            DecodeState::Escape => {
                if byte == b'[' {
                    self.state = DecodeState::Csi;
                    None
                } else {
                    // Lone escape: treat the byte as a key of its own
                    self.state = DecodeState::Ground;
                    self.ground(byte)
                }
            }
            DecodeState::Csi => {
                self.state = DecodeState::Ground;
                let command = match byte {
                    b'A' => Command::AdjustGain(self.gain_step),
                    b'B' => Command::AdjustGain(-self.gain_step),
                    b'C' => Command::SeekRelative {
                        seconds: self.seek_seconds,
                    },
                    b'D' => Command::SeekRelative {
                        seconds: -self.seek_seconds,
                    },
                    _ => return None,
                };
                Some(Input::Command(command))
            }
        }
    }

    fn ground(&mut self, byte: u8) -> Option<Input> {
        let command = match byte {
            CTRL_C | CTRL_D | b'q' | b'Q' => Command::Exit,
            b'e' | b'E' => Command::SeekToEnd,
            b'r' | b'R' => Command::SeekToStart,
            b'l' | b'L' => Command::ToggleLoop,
            b' ' => Command::TogglePlay,
            TAB => return Some(Input::ToggleHelp),
            ESC => {
                self.state = DecodeState::Escape;
                return None;
            }
            _ => return None,
        };
        Some(Input::Command(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<Input> {
        let mut decoder = KeyDecoder::new(5, 0.05);
        bytes.iter().filter_map(|&b| decoder.feed(b)).collect()
    }

    #[test]
    fn test_single_keys() {
        assert_eq!(
            decode(b" lre\t"),
            vec![
                Input::Command(Command::TogglePlay),
                Input::Command(Command::ToggleLoop),
                Input::Command(Command::SeekToStart),
                Input::Command(Command::SeekToEnd),
                Input::ToggleHelp,
            ]
        );
    }

    #[test]
    fn test_exit_keys() {
        assert_eq!(decode(&[4]), vec![Input::Command(Command::Exit)]);
        assert_eq!(decode(&[3]), vec![Input::Command(Command::Exit)]);
        assert_eq!(decode(b"q"), vec![Input::Command(Command::Exit)]);
    }

    #[test]
    fn test_arrow_keys() {
        assert_eq!(
            decode(b"\x1b[C\x1b[D\x1b[A\x1b[B"),
            vec![
                Input::Command(Command::SeekRelative { seconds: 5 }),
                Input::Command(Command::SeekRelative { seconds: -5 }),
                Input::Command(Command::AdjustGain(0.05)),
                Input::Command(Command::AdjustGain(-0.05)),
            ]
        );
    }

    #[test]
    fn test_split_escape_sequence() {
        let mut decoder = KeyDecoder::new(10, 0.1);
        assert_eq!(decoder.feed(ESC), None);
        assert_eq!(decoder.feed(b'['), None);
        assert_eq!(
            decoder.feed(b'C'),
            Some(Input::Command(Command::SeekRelative { seconds: 10 }))
        );
    }

    #[test]
    fn test_lone_escape_does_not_swallow_next_key() {
        assert_eq!(decode(b"\x1bl"), vec![Input::Command(Command::ToggleLoop)]);
    }

    #[test]
    fn test_unknown_bytes_are_ignored() {
        assert_eq!(decode(b"xyz\x1b[Z"), Vec::<Input>::new());
        // Decoder is back in ground state after the unknown sequence
        assert_eq!(decode(b"\x1b[Z "), vec![Input::Command(Command::TogglePlay)]);
    }
}
