// Playback session
// Owns the output driver and the control side of the transport for one file

use log::{error, info, warn};
use ringbuf::traits::Consumer;
use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use crate::audio::events::{event_queue, EventConsumer, TransportEvent};
use crate::audio::format::StreamFormat;
use crate::audio::output::{CpalOutput, OutputDriver};
use crate::audio::producer::FrameProducer;
use crate::audio::source::SourceReader;
use crate::audio::transport::TransportState;
use crate::control::{apply_command, Command, Flow};
use crate::error::{PlayerError, Result};
use crate::settings::PlayerSettings;
use crate::status::Status;

/// Source of commands, and optionally a place to show status
pub trait ControlSurface {
    /// Wait briefly for the next command; `Ok(None)` if nothing arrived
    fn poll(&mut self) -> io::Result<Option<Command>>;

    fn show(&mut self, _status: &Status) -> io::Result<()> {
        Ok(())
    }
}

pub struct Session<D: OutputDriver> {
    identity: String,
    format: StreamFormat,
    state: Arc<TransportState>,
    events: EventConsumer,
    driver: Option<D>,
    started: bool,
}

impl Session<CpalOutput> {
    /// Open `path` on the default output device
    pub fn open(path: &Path, settings: &PlayerSettings) -> Result<Self> {
        let source: SourceReader<File> = SourceReader::open(path)?;
        let identity = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::open_with(identity, source, settings, CpalOutput::open)
    }
}

impl<D: OutputDriver> Session<D> {
    /// Open a session on any source, with the driver built by `build`
    ///
    /// The format is validated before the driver is built, so an invalid
    /// format never reaches a device.
    pub fn open_with<R, F>(
        identity: impl Into<String>,
        source: SourceReader<R>,
        settings: &PlayerSettings,
        build: F,
    ) -> Result<Self>
    where
        R: Read + Seek,
        F: FnOnce(&StreamFormat, FrameProducer<R>) -> Result<D>,
    {
        let identity = identity.into();
        let format = settings.format;
        format.validate()?;

        let state = Arc::new(TransportState::new(
            source.len(),
            settings.playback.volume,
            settings.playback.loop_after_complete,
            !settings.playback.start_paused,
        ));
        let (event_tx, event_rx) = event_queue();
        let length = source.len();
        let producer = FrameProducer::new(source, Arc::clone(&state), format, event_tx);
        let driver = build(&format, producer)?;

        info!(
            "Opened {} ({} bytes, {:.1}s at {} Hz, {} channels, {} bytes per sample)",
            identity,
            length,
            format.bytes_to_seconds(length),
            format.sample_rate,
            format.channel_count,
            format.sample_size
        );

        Ok(Self {
            identity,
            format,
            state,
            events: event_rx,
            driver: Some(driver),
            started: false,
        })
    }

    pub fn format(&self) -> &StreamFormat {
        &self.format
    }

    pub fn status(&self) -> Status {
        Status::capture(&self.identity, &self.state, &self.format)
    }

    pub fn is_closed(&self) -> bool {
        self.driver.is_none()
    }

    pub fn apply(&self, command: Command) -> Flow {
        apply_command(&self.state, &self.format, command)
    }

    /// Start the output stream; calling it again is a no-op
    pub fn start(&mut self) -> Result<()> {
        let driver = self
            .driver
            .as_mut()
            .ok_or_else(|| PlayerError::Device("session is closed".to_string()))?;
        if !self.started {
            driver.start()?;
            self.started = true;
        }
        Ok(())
    }

    /// Drive the control loop until exit is requested or the device fails
    pub fn run<C: ControlSurface>(&mut self, surface: &mut C) -> Result<()> {
        self.start()?;
        surface.show(&self.status())?;

        loop {
            self.check_device()?;
            self.drain_events();

            if let Some(command) = surface.poll()? {
                if self.apply(command) == Flow::Exit {
                    info!("Exit requested");
                    return Ok(());
                }
            }
            surface.show(&self.status())?;
        }
    }

    /// Stop and release the output stream and, with it, the source
    ///
    /// Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            if let Err(e) = driver.stop() {
                warn!("Failed to stop output cleanly: {}", e);
            }
            // The producer, and with it the source handle, lives in the driver
            drop(driver);
            self.drain_events();
            info!("Closed {}", self.identity);
        }
    }

    fn check_device(&self) -> Result<()> {
        if let Some(message) = self.driver.as_ref().and_then(|d| d.take_error()) {
            error!("Output device failed: {}", message);
            return Err(PlayerError::Device(message));
        }
        Ok(())
    }

    fn drain_events(&mut self) {
        while let Some(event) = self.events.try_pop() {
            match event {
                TransportEvent::Looped { at } => {
                    info!("End of {} at byte {}, looping", self.identity, at)
                }
                TransportEvent::Finished { at } => {
                    info!("End of {} at byte {}, stopped", self.identity, at)
                }
                TransportEvent::ReadFailed { at, kind } => warn!(
                    "Read of {} at byte {} failed ({:?}), treated as end of stream",
                    self.identity, at, kind
                ),
            }
        }
    }
}

impl<D: OutputDriver> Drop for Session<D> {
    fn drop(&mut self) {
        self.close();
    }
}
