// Frame producer: the body of the real-time audio callback
//
// One call renders exactly one period. Nothing in here allocates, locks or
// logs; the only I/O is a single bounded read of one block.

use ringbuf::traits::Producer;
use std::io::{Read, Seek};
use std::sync::Arc;

use super::events::{EventProducer, TransportEvent};
use super::format::StreamFormat;
use super::sample::PcmSample;
use super::source::SourceReader;
use super::transport::{StateDelta, TransportSnapshot, TransportState};

/// Render one period from the bytes read at `snapshot.cursor`
///
/// `data` holds the bytes actually read (at most `block_bytes`), `out` receives
/// exactly one period of samples. Returns the change to publish to the
/// transport; the caller decides how to apply it.
pub fn render_period<S: PcmSample>(
    snapshot: &TransportSnapshot,
    block_bytes: usize,
    data: &[u8],
    out: &mut [S],
) -> StateDelta {
    if !snapshot.playing {
        out.fill(S::SILENCE);
        return StateDelta::Idle;
    }

    let written = data
        .chunks_exact(S::WIDTH)
        .zip(out.iter_mut())
        .map(|(bytes, slot)| *slot = S::from_le_slice(bytes).scaled(snapshot.gain))
        .count();
    out[written..].fill(S::SILENCE);

    // The cursor always moves by a whole block, a short read only marks the end
    let from = snapshot.cursor;
    let to = from.saturating_add(block_bytes as i64);
    if data.len() < block_bytes || to >= snapshot.length {
        if snapshot.loop_enabled {
            StateDelta::Looped { from }
        } else {
            StateDelta::Finished { from }
        }
    } else {
        StateDelta::Advanced { from, to }
    }
}

pub struct FrameProducer<R> {
    source: SourceReader<R>,
    state: Arc<TransportState>,
    format: StreamFormat,
    /// Reused for every read, exactly one block long
    block: Vec<u8>,
    events: EventProducer,
}

impl<R: Read + Seek> FrameProducer<R> {
    pub fn new(
        source: SourceReader<R>,
        state: Arc<TransportState>,
        format: StreamFormat,
        events: EventProducer,
    ) -> Self {
        Self {
            source,
            state,
            block: vec![0u8; format.block_bytes() as usize],
            format,
            events,
        }
    }

    pub fn format(&self) -> &StreamFormat {
        &self.format
    }

    /// Fill one period of output and publish the resulting state change
    ///
    /// `out` must hold exactly `samples_per_period` samples of the configured width.
    pub fn fill_period<S: PcmSample>(&mut self, out: &mut [S]) -> StateDelta {
        debug_assert_eq!(S::WIDTH, self.format.sample_size as usize);
        debug_assert_eq!(out.len() * S::WIDTH, self.block.len());

        let snapshot = self.state.snapshot();
        let bytes_read = if snapshot.playing {
            self.read_block(snapshot.cursor)
        } else {
            0
        };

        let delta = render_period(&snapshot, self.block.len(), &self.block[..bytes_read], out);
        self.state.apply(delta);

        match delta {
            // An empty source loops every period; not worth a report each time
            StateDelta::Looped { .. } if snapshot.length == 0 => {}
            StateDelta::Looped { from } => self.report(TransportEvent::Looped { at: from }),
            StateDelta::Finished { from } => self.report(TransportEvent::Finished { at: from }),
            StateDelta::Idle | StateDelta::Advanced { .. } => {}
        }
        delta
    }

    fn read_block(&mut self, cursor: i64) -> usize {
        let offset = cursor.max(0) as u64;
        match self.source.read_at(offset, &mut self.block) {
            Ok(n) => n,
            Err(e) => {
                self.report(TransportEvent::ReadFailed {
                    at: cursor,
                    kind: e.kind(),
                });
                0
            }
        }
    }

    fn report(&mut self, event: TransportEvent) {
        // A full queue means nobody is draining; dropping is fine
        let _ = self.events.try_push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::events::{event_queue, EventConsumer};
    use ringbuf::traits::Consumer;
    use std::io::{self, Cursor, SeekFrom};

    /// 128 frames of mono 16-bit audio: 256-byte blocks
    fn mono_format() -> StreamFormat {
        StreamFormat::new(8000, 2, 1, 128).unwrap()
    }

    fn ramp(samples: usize) -> Vec<u8> {
        (0..samples)
            .flat_map(|i| ((i as i16) + 1).to_le_bytes())
            .collect()
    }

    fn producer(
        data: Vec<u8>,
        loop_enabled: bool,
    ) -> (FrameProducer<Cursor<Vec<u8>>>, Arc<TransportState>, EventConsumer) {
        let source = SourceReader::from_reader(Cursor::new(data)).unwrap();
        let state = Arc::new(TransportState::new(source.len(), 1.0, loop_enabled, true));
        let (tx, rx) = event_queue();
        let producer = FrameProducer::new(source, Arc::clone(&state), mono_format(), tx);
        (producer, state, rx)
    }

    fn period() -> Vec<i16> {
        vec![0x7eadi16; mono_format().samples_per_period()]
    }

    #[test]
    fn test_paused_period_is_silent_and_idle() {
        let (mut producer, state, _rx) = producer(ramp(1024), false);
        state.seek_absolute(512);
        state.toggle_play();

        let mut out = period();
        assert_eq!(producer.fill_period(&mut out), StateDelta::Idle);
        assert_eq!(out.len() * 2, mono_format().block_bytes() as usize);
        assert!(out.iter().all(|&s| s == 0));
        assert_eq!(state.cursor(), 512);
    }

    #[test]
    fn test_playing_period_passes_samples_through() {
        let (mut producer, state, _rx) = producer(ramp(1024), false);
        let mut out = period();
        let delta = producer.fill_period(&mut out);

        assert_eq!(delta, StateDelta::Advanced { from: 0, to: 256 });
        assert_eq!(state.cursor(), 256);
        let expected: Vec<i16> = (1..=128).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_gain_is_applied() {
        let (mut producer, state, _rx) = producer(ramp(1024), false);
        state.set_gain(0.0);
        let mut out = period();
        producer.fill_period(&mut out);
        assert!(out.iter().all(|&s| s == 0));
        // Gain 0 still advances the cursor
        assert_eq!(state.cursor(), 256);

        state.set_gain(0.5);
        producer.fill_period(&mut out);
        assert_eq!(out[0], 64); // sample 129 * 0.5
    }

    #[test]
    fn test_stops_after_last_block() {
        // 2048 bytes, 512-byte blocks, no loop
        let format = StreamFormat::new(8000, 2, 2, 128).unwrap();
        let source = SourceReader::from_reader(Cursor::new(ramp(1024))).unwrap();
        let state = Arc::new(TransportState::new(2048, 1.0, false, true));
        let (tx, mut rx) = event_queue();
        let mut producer = FrameProducer::new(source, Arc::clone(&state), format, tx);

        let mut out = vec![0i16; format.samples_per_period()];
        for _ in 0..3 {
            producer.fill_period(&mut out);
            assert!(state.is_playing());
        }
        producer.fill_period(&mut out);
        assert!(!state.is_playing());
        assert_eq!(state.cursor(), 2048);
        assert_eq!(rx.try_pop(), Some(TransportEvent::Finished { at: 1536 }));

        out.fill(1);
        assert_eq!(producer.fill_period(&mut out), StateDelta::Idle);
        assert!(out.iter().all(|&s| s == 0));
        assert_eq!(state.cursor(), 2048);
    }

    #[test]
    fn test_loop_round_trip() {
        // Four blocks exactly
        let (mut producer, state, mut rx) = producer(ramp(512), true);
        let mut out = period();
        for _ in 0..4 {
            producer.fill_period(&mut out);
        }
        assert_eq!(state.cursor(), 0);
        assert!(state.is_playing());
        assert_eq!(rx.try_pop(), Some(TransportEvent::Looped { at: 768 }));

        producer.fill_period(&mut out);
        assert!(out.iter().any(|&s| s != 0));
        assert_eq!(out[0], 1);
    }

    #[test]
    fn test_source_shorter_than_one_block() {
        // 100 bytes of real PCM, 256-byte block
        let (mut producer, state, _rx) = producer(ramp(50), false);
        let mut out = period();
        producer.fill_period(&mut out);

        let expected: Vec<i16> = (1..=50).collect();
        assert_eq!(&out[..50], &expected[..]);
        assert!(out[50..].iter().all(|&s| s == 0));
        assert!(!state.is_playing());
        assert_eq!(state.cursor(), 100);
    }

    #[test]
    fn test_short_source_loops_on_first_period() {
        let (mut producer, state, _rx) = producer(ramp(50), true);
        let mut out = period();
        producer.fill_period(&mut out);
        assert!(state.is_playing());
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn test_playing_at_end_stops_with_silence() {
        let (mut producer, state, _rx) = producer(ramp(1024), false);
        state.seek_to_end();
        let mut out = period();
        producer.fill_period(&mut out);
        assert!(out.iter().all(|&s| s == 0));
        assert!(!state.is_playing());
        assert_eq!(state.cursor(), 2048);
    }

    #[test]
    fn test_empty_source() {
        let (mut producer, state, _rx) = producer(Vec::new(), false);
        let mut out = period();
        producer.fill_period(&mut out);
        assert!(out.iter().all(|&s| s == 0));
        assert!(!state.is_playing());
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn test_empty_looping_source_reports_nothing() {
        let (mut producer, state, mut rx) = producer(Vec::new(), true);
        let mut out = period();
        for _ in 0..3 {
            assert_eq!(producer.fill_period(&mut out), StateDelta::Looped { from: 0 });
        }
        assert!(out.iter().all(|&s| s == 0));
        assert!(state.is_playing());
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn test_render_period_is_pure() {
        let snapshot = TransportSnapshot {
            cursor: 1024,
            length: 4096,
            playing: true,
            loop_enabled: false,
            gain: 1.0,
        };
        let data: Vec<u8> = [5i16, -5].iter().flat_map(|s| s.to_le_bytes()).collect();
        let mut out = [9i16; 2];
        let delta = render_period(&snapshot, 4, &data, &mut out);
        assert_eq!(out, [5, -5]);
        assert_eq!(delta, StateDelta::Advanced { from: 1024, to: 1028 });
    }

    #[test]
    fn test_eight_and_thirty_two_bit_samples() {
        let snapshot = TransportSnapshot {
            cursor: 0,
            length: 1 << 20,
            playing: true,
            loop_enabled: false,
            gain: 1.0,
        };
        let mut out8 = [0i8; 3];
        render_period(&snapshot, 3, &[0x80, 0x7f, 0x01], &mut out8);
        assert_eq!(out8, [i8::MIN, i8::MAX, 1]);

        let data: Vec<u8> = [i32::MIN, 7].iter().flat_map(|s| s.to_le_bytes()).collect();
        let mut out32 = [0i32; 2];
        render_period(&snapshot, 8, &data, &mut out32);
        assert_eq!(out32, [i32::MIN, 7]);
    }

    /// Source that fails every read after the first
    struct Flaky {
        inner: Cursor<Vec<u8>>,
        reads: usize,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.reads > 1 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk gone"));
            }
            self.inner.read(buf)
        }
    }

    impl Seek for Flaky {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn test_read_failure_ends_stream() {
        let flaky = Flaky {
            inner: Cursor::new(ramp(1024)),
            reads: 0,
        };
        let source = SourceReader::from_reader(flaky).unwrap();
        let state = Arc::new(TransportState::new(source.len(), 1.0, false, true));
        let (tx, mut rx) = event_queue();
        let mut producer = FrameProducer::new(source, Arc::clone(&state), mono_format(), tx);

        let mut out = period();
        producer.fill_period(&mut out);
        assert_eq!(state.cursor(), 256);

        producer.fill_period(&mut out);
        assert!(out.iter().all(|&s| s == 0));
        assert!(!state.is_playing());
        assert_eq!(
            rx.try_pop(),
            Some(TransportEvent::ReadFailed {
                at: 256,
                kind: io::ErrorKind::Other
            })
        );
        assert_eq!(rx.try_pop(), Some(TransportEvent::Finished { at: 256 }));
    }
}
