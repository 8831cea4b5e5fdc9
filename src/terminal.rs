// Terminal front end
// Raw keyboard input and the status screen

use std::io::{self, Read, Stdin, Write};
use std::thread;
use std::time::Duration;

use binplay_lib::control::keys::{Input, KeyDecoder, KEY_HELP};
use binplay_lib::{Command, ControlSurface, PlayerSettings, Status};

/// How long a poll waits for a key before the screen is refreshed
const POLL_INTERVAL: Duration = Duration::from_millis(200);

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H"; // Clear tty and reset cursor

#[cfg(unix)]
mod tty {
    use std::io;
    use std::mem::MaybeUninit;

    /// Non-canonical, no-echo stdin; the previous mode is restored on drop
    pub struct RawTerminal {
        original: libc::termios,
    }

    impl RawTerminal {
        pub fn enable(poll_tenths: u8) -> io::Result<Self> {
            let fd = libc::STDIN_FILENO;
            let mut original = MaybeUninit::<libc::termios>::uninit();
            // SAFETY: tcgetattr fully initialises the struct when it returns 0
            let original = unsafe {
                if libc::tcgetattr(fd, original.as_mut_ptr()) != 0 {
                    return Err(io::Error::last_os_error());
                }
                original.assume_init()
            };

            let mut attrs = original;
            attrs.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG);
            // read() returns after one byte or after VTIME tenths of a second
            attrs.c_cc[libc::VMIN] = 0;
            attrs.c_cc[libc::VTIME] = poll_tenths;
            // SAFETY: attrs is a valid termios copied from the terminal
            if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &attrs) } != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(Self { original })
        }
    }

    impl Drop for RawTerminal {
        fn drop(&mut self) {
            // SAFETY: restoring the attributes read in enable()
            unsafe {
                libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &self.original);
            }
        }
    }
}

#[cfg(not(unix))]
mod tty {
    use std::io;

    pub struct RawTerminal;

    impl RawTerminal {
        pub fn enable(_poll_tenths: u8) -> io::Result<Self> {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "raw terminal mode is only available on unix",
            ))
        }
    }
}

pub struct TerminalSurface {
    stdin: Stdin,
    decoder: KeyDecoder,
    show_help: bool,
    json: bool,
    raw: Option<tty::RawTerminal>,
}

impl TerminalSurface {
    pub fn new(settings: &PlayerSettings, json: bool) -> Self {
        let tenths = (POLL_INTERVAL.as_millis() / 100) as u8;
        let raw = match tty::RawTerminal::enable(tenths) {
            Ok(terminal) => Some(terminal),
            Err(e) => {
                log::warn!("Keyboard controls unavailable: {}", e);
                None
            }
        };

        Self {
            stdin: io::stdin(),
            decoder: KeyDecoder::new(settings.control.seek_seconds, settings.control.gain_step),
            show_help: false,
            json,
            raw,
        }
    }
}

impl ControlSurface for TerminalSurface {
    fn poll(&mut self) -> io::Result<Option<Command>> {
        let mut byte = [0u8; 1];
        let read = self.stdin.lock().read(&mut byte)?;
        if read == 0 {
            if self.raw.is_none() {
                // Not a terminal and nothing left to read: just keep playing
                thread::sleep(POLL_INTERVAL);
            }
            return Ok(None);
        }

        match self.decoder.feed(byte[0]) {
            Some(Input::Command(command)) => Ok(Some(command)),
            Some(Input::ToggleHelp) => {
                self.show_help = !self.show_help;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn show(&mut self, status: &Status) -> io::Result<()> {
        let mut out = io::stdout().lock();

        if self.json {
            let line = serde_json::to_string(status)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            writeln!(out, "{}", line)?;
            return out.flush();
        }

        write!(out, "{}", CLEAR_SCREEN)?;
        writeln!(out, "{}", status)?;
        if self.show_help {
            writeln!(out, "\nHELP MENU")?;
            for line in KEY_HELP {
                writeln!(out, "  {}", line)?;
            }
        }
        out.flush()
    }
}
