// Audio output drivers
// cpal drives the frame producer from the device's real-time callback;
// ManualOutput drives it on demand without any device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig, SupportedBufferSize};
use log::{debug, error, info};
use parking_lot::Mutex;
use std::io::{Read, Seek};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::format::{SampleKind, StreamFormat};
use super::producer::FrameProducer;
use super::sample::PcmSample;
use super::transport::StateDelta;
use crate::error::{PlayerError, Result};

/// Owner of the periodic invocation of a frame producer
pub trait OutputDriver {
    /// Begin (or resume) invoking the producer
    fn start(&mut self) -> Result<()>;

    /// Stop invoking the producer; returns once no callback is running
    fn stop(&mut self) -> Result<()>;

    /// Error reported by the backend since the last call, if any
    fn take_error(&self) -> Option<String>;
}

/// Error reported from a backend thread, read by the control loop
type ErrorSlot = Arc<Mutex<Option<String>>>;

/// Device sample formats we can convert into, best first after an exact match
const DEVICE_FORMATS: &[SampleFormat] = &[
    SampleFormat::F32,
    SampleFormat::I32,
    SampleFormat::I16,
    SampleFormat::F64,
    SampleFormat::U16,
    SampleFormat::U32,
    SampleFormat::I8,
    SampleFormat::U8,
];

/// Pick the device sample format to render into
///
/// The file's own width is used when the device offers it, so samples pass
/// through untouched; otherwise the first convertible format in
/// `DEVICE_FORMATS` that the device offers.
fn choose_device_format(
    wanted: SampleFormat,
    offered: impl IntoIterator<Item = SampleFormat>,
) -> Option<SampleFormat> {
    let offered: Vec<SampleFormat> = offered.into_iter().collect();
    if offered.contains(&wanted) {
        return Some(wanted);
    }
    DEVICE_FORMATS
        .iter()
        .copied()
        .find(|candidate| offered.contains(candidate))
}

/// Hands the device exactly what it asks for while the producer always
/// renders whole periods. Both buffers are allocated before the stream starts.
struct PeriodStage<S> {
    samples: Vec<S>,
    pos: usize,
}

impl<S: PcmSample> PeriodStage<S> {
    fn new(samples_per_period: usize) -> Self {
        Self {
            samples: vec![S::SILENCE; samples_per_period],
            pos: samples_per_period,
        }
    }

    /// Fill `out` in the device's sample type, rendering periods as needed
    fn fill<R, T>(&mut self, producer: &mut FrameProducer<R>, out: &mut [T])
    where
        R: Read + Seek,
        T: FromSample<S>,
    {
        let mut written = 0;
        while written < out.len() {
            if self.pos == self.samples.len() {
                producer.fill_period(&mut self.samples);
                self.pos = 0;
            }
            let n = (out.len() - written).min(self.samples.len() - self.pos);
            let staged = &self.samples[self.pos..self.pos + n];
            for (slot, &sample) in out[written..written + n].iter_mut().zip(staged) {
                *slot = T::from_sample_(sample);
            }
            written += n;
            self.pos += n;
        }
    }
}

pub struct CpalOutput {
    stream: Stream,
    error: ErrorSlot,
}

impl CpalOutput {
    /// Open the default output device for `format` and bind the producer to it
    ///
    /// The device must support the exact rate, channel count and period size;
    /// there is no fallback. Samples are converted to the device's own sample
    /// format when it does not offer the file's width.
    pub fn open<R>(format: &StreamFormat, producer: FrameProducer<R>) -> Result<Self>
    where
        R: Read + Seek + Send + 'static,
    {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| PlayerError::Device("No output device available".to_string()))?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using audio device: {}", device_name);

        let kind = format.sample_kind().ok_or_else(|| {
            PlayerError::UnsupportedFormat(format!("sample size of {} bytes", format.sample_size))
        })?;
        let file_format = match kind {
            SampleKind::I8 => SampleFormat::I8,
            SampleKind::I16 => SampleFormat::I16,
            SampleKind::I32 => SampleFormat::I32,
        };
        let device_format = Self::device_format(&device, &device_name, format, file_format)?;
        if device_format != file_format {
            info!("Converting {:?} samples to {:?} for the device", file_format, device_format);
        }

        let config = StreamConfig {
            channels: format.channel_count,
            sample_rate: cpal::SampleRate(format.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(format.frames_per_period),
        };
        debug!(
            "Audio config: {} channels, {}Hz, {:?}, {} frames (~{:.1}ms per period)",
            config.channels,
            format.sample_rate,
            device_format,
            format.frames_per_period,
            format.period_duration().as_secs_f64() * 1000.0
        );

        let error: ErrorSlot = Arc::new(Mutex::new(None));
        let stream = match kind {
            SampleKind::I8 => {
                Self::build_for::<i8, R>(&device, &config, device_format, producer, error.clone())?
            }
            SampleKind::I16 => {
                Self::build_for::<i16, R>(&device, &config, device_format, producer, error.clone())?
            }
            SampleKind::I32 => {
                Self::build_for::<i32, R>(&device, &config, device_format, producer, error.clone())?
            }
        };

        Ok(Self { stream, error })
    }

    /// Device sample format for a config matching rate, channels and period
    fn device_format(
        device: &cpal::Device,
        device_name: &str,
        format: &StreamFormat,
        file_format: SampleFormat,
    ) -> Result<SampleFormat> {
        let configs = device
            .supported_output_configs()
            .map_err(|e| PlayerError::Device(format!("Failed to get device configs: {}", e)))?;

        let offered = configs
            .filter(|range| {
                let period_ok = match range.buffer_size() {
                    SupportedBufferSize::Range { min, max } => {
                        (*min..=*max).contains(&format.frames_per_period)
                    }
                    SupportedBufferSize::Unknown => true,
                };
                range.channels() == format.channel_count
                    && range.min_sample_rate().0 <= format.sample_rate
                    && range.max_sample_rate().0 >= format.sample_rate
                    && period_ok
            })
            .map(|range| range.sample_format());

        choose_device_format(file_format, offered).ok_or_else(|| {
            PlayerError::UnsupportedFormat(format!(
                "{} cannot play {} Hz, {} channels in periods of {} frames",
                device_name, format.sample_rate, format.channel_count, format.frames_per_period
            ))
        })
    }

    /// Build a stream for file samples `S` in the device's sample format
    fn build_for<S, R>(
        device: &cpal::Device,
        config: &StreamConfig,
        device_format: SampleFormat,
        producer: FrameProducer<R>,
        error: ErrorSlot,
    ) -> Result<Stream>
    where
        S: PcmSample,
        R: Read + Seek + Send + 'static,
        f32: FromSample<S>,
        f64: FromSample<S>,
        i8: FromSample<S>,
        i16: FromSample<S>,
        i32: FromSample<S>,
        u8: FromSample<S>,
        u16: FromSample<S>,
        u32: FromSample<S>,
    {
        match device_format {
            SampleFormat::F32 => Self::build_stream::<S, f32, R>(device, config, producer, error),
            SampleFormat::F64 => Self::build_stream::<S, f64, R>(device, config, producer, error),
            SampleFormat::I8 => Self::build_stream::<S, i8, R>(device, config, producer, error),
            SampleFormat::I16 => Self::build_stream::<S, i16, R>(device, config, producer, error),
            SampleFormat::I32 => Self::build_stream::<S, i32, R>(device, config, producer, error),
            SampleFormat::U8 => Self::build_stream::<S, u8, R>(device, config, producer, error),
            SampleFormat::U16 => Self::build_stream::<S, u16, R>(device, config, producer, error),
            SampleFormat::U32 => Self::build_stream::<S, u32, R>(device, config, producer, error),
            other => Err(PlayerError::UnsupportedFormat(format!(
                "device sample format {:?}",
                other
            ))),
        }
    }

    fn build_stream<S, T, R>(
        device: &cpal::Device,
        config: &StreamConfig,
        mut producer: FrameProducer<R>,
        error: ErrorSlot,
    ) -> Result<Stream>
    where
        S: PcmSample,
        T: SizedSample + FromSample<S> + Send + 'static,
        R: Read + Seek + Send + 'static,
    {
        let mut stage = PeriodStage::<S>::new(producer.format().samples_per_period());

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    stage.fill(&mut producer, data);
                },
                move |err| {
                    error!("Audio output error: {}", err);
                    *error.lock() = Some(err.to_string());
                },
                None,
            )
            .map_err(|e| match e {
                cpal::BuildStreamError::StreamConfigNotSupported => PlayerError::UnsupportedFormat(
                    "stream configuration rejected by device".to_string(),
                ),
                other => PlayerError::Device(format!("Failed to build output stream: {}", other)),
            })
    }
}

impl OutputDriver for CpalOutput {
    fn start(&mut self) -> Result<()> {
        self.stream
            .play()
            .map_err(|e| PlayerError::Device(format!("Failed to start stream: {}", e)))?;
        info!("Audio stream started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stream
            .pause()
            .map_err(|e| PlayerError::Device(format!("Failed to stop stream: {}", e)))?;
        info!("Audio stream stopped");
        Ok(())
    }

    fn take_error(&self) -> Option<String> {
        self.error.lock().take()
    }
}

/// Output driver without a device
///
/// Periods are rendered when `render` is called, from whatever thread calls
/// it. Clones share the same producer, so one clone can sit in a session while
/// another renders.
pub struct ManualOutput<R> {
    producer: Arc<Mutex<FrameProducer<R>>>,
    running: Arc<AtomicBool>,
    error: ErrorSlot,
}

impl<R> Clone for ManualOutput<R> {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
            running: Arc::clone(&self.running),
            error: Arc::clone(&self.error),
        }
    }
}

impl<R: Read + Seek> ManualOutput<R> {
    pub fn open(format: &StreamFormat, producer: FrameProducer<R>) -> Result<Self> {
        format.validate()?;
        Ok(Self {
            producer: Arc::new(Mutex::new(producer)),
            running: Arc::new(AtomicBool::new(false)),
            error: Arc::new(Mutex::new(None)),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Render one period into `out`
    ///
    /// Returns None (and silence) while the driver is stopped.
    pub fn render<S: PcmSample>(&self, out: &mut [S]) -> Option<StateDelta> {
        if !self.is_running() {
            out.fill(S::SILENCE);
            return None;
        }
        Some(self.producer.lock().fill_period(out))
    }

    /// Report a backend failure, as a device would from its error callback
    pub fn fail(&self, message: impl Into<String>) {
        *self.error.lock() = Some(message.into());
    }
}

impl<R: Read + Seek> OutputDriver for ManualOutput<R> {
    fn start(&mut self) -> Result<()> {
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Release);
        Ok(())
    }

    fn take_error(&self) -> Option<String> {
        self.error.lock().take()
    }
}
