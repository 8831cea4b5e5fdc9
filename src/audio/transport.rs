// Transport state shared between the control thread and the audio callback
//
// Every field is its own atomic. Control operations are single stores or
// compare-and-swap loops on one field, so neither side ever waits on the other.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};

/// Point-in-time copy of the transport fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSnapshot {
    pub cursor: i64,
    pub length: i64,
    pub playing: bool,
    pub loop_enabled: bool,
    pub gain: f32,
}

/// What one producer period did to the transport
///
/// `from` is the cursor the period started at. The delta is only published if
/// the cursor still holds that value, so a seek issued mid-period wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateDelta {
    /// Paused: nothing read, nothing moved
    Idle,
    /// Normal advance by one block
    Advanced { from: i64, to: i64 },
    /// End of stream with looping on: back to the start
    Looped { from: i64 },
    /// End of stream with looping off: park at the end and pause
    Finished { from: i64 },
}

pub struct TransportState {
    length: i64,
    cursor: AtomicI64,
    playing: AtomicBool,
    loop_enabled: AtomicBool,
    /// f32 bit pattern
    gain: AtomicU32,
}

impl TransportState {
    pub fn new(source_length: u64, gain: f32, loop_enabled: bool, playing: bool) -> Self {
        let state = Self {
            length: i64::try_from(source_length).unwrap_or(i64::MAX),
            cursor: AtomicI64::new(0),
            playing: AtomicBool::new(playing),
            loop_enabled: AtomicBool::new(loop_enabled),
            gain: AtomicU32::new(1.0f32.to_bits()),
        };
        state.set_gain(gain);
        state
    }

    fn clamp_cursor(&self, cursor: i64) -> i64 {
        cursor.clamp(0, self.length)
    }

    pub fn source_length(&self) -> u64 {
        self.length as u64
    }

    pub fn cursor(&self) -> i64 {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled.load(Ordering::Acquire)
    }

    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Acquire))
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            cursor: self.cursor(),
            length: self.length,
            playing: self.is_playing(),
            loop_enabled: self.loop_enabled(),
            gain: self.gain(),
        }
    }

    // ===== Control operations =====

    pub fn seek_absolute(&self, byte_offset: i64) {
        self.cursor
            .store(self.clamp_cursor(byte_offset), Ordering::Release);
    }

    /// Move the cursor by a signed byte distance, clamped to the source
    pub fn seek_relative(&self, delta_bytes: i64) {
        // The closure always returns Some, so this cannot fail
        let _ = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cursor| {
                Some(self.clamp_cursor(cursor.saturating_add(delta_bytes)))
            });
    }

    pub fn seek_to_start(&self) {
        self.seek_absolute(0);
    }

    pub fn seek_to_end(&self) {
        self.seek_absolute(self.length);
    }

    pub fn toggle_play(&self) {
        self.playing.fetch_xor(true, Ordering::AcqRel);
    }

    pub fn toggle_loop(&self) {
        self.loop_enabled.fetch_xor(true, Ordering::AcqRel);
    }

    /// Set the gain directly, clamped to [0.0, 1.0]
    pub fn set_gain(&self, gain: f32) {
        if !gain.is_finite() {
            return;
        }
        self.gain
            .store(gain.clamp(0.0, 1.0).to_bits(), Ordering::Release);
    }

    /// Nudge the gain by `delta`, clamped to [0.0, 1.0]
    pub fn adjust_gain(&self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        let _ = self
            .gain
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                let gain = (f32::from_bits(bits) + delta).clamp(0.0, 1.0);
                Some(gain.to_bits())
            });
    }

    // ===== Producer side =====

    /// Publish the outcome of one producer period
    pub fn apply(&self, delta: StateDelta) {
        match delta {
            StateDelta::Idle => {}
            StateDelta::Advanced { from, to } => {
                let _ = self.cursor.compare_exchange(
                    from,
                    self.clamp_cursor(to),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
            }
            StateDelta::Looped { from } => {
                let _ = self
                    .cursor
                    .compare_exchange(from, 0, Ordering::AcqRel, Ordering::Acquire);
            }
            StateDelta::Finished { from } => {
                let parked = self.cursor.compare_exchange(
                    from,
                    self.length,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                if parked.is_ok() {
                    self.playing.store(false, Ordering::Release);
                }
            }
        }
    }
}
