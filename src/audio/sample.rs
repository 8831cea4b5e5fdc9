// Integer PCM sample types the producer can write

/// A signed little-endian PCM sample
pub trait PcmSample: Copy + Send + 'static {
    /// Bytes per sample in the source
    const WIDTH: usize;
    const SILENCE: Self;

    /// Decode from exactly `WIDTH` little-endian bytes
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Multiply by `gain`, saturating at the sample range
    fn scaled(self, gain: f32) -> Self;
}

impl PcmSample for i8 {
    const WIDTH: usize = 1;
    const SILENCE: Self = 0;

    fn from_le_slice(bytes: &[u8]) -> Self {
        i8::from_le_bytes([bytes[0]])
    }

    fn scaled(self, gain: f32) -> Self {
        // float -> int `as` saturates
        (self as f32 * gain) as i8
    }
}

impl PcmSample for i16 {
    const WIDTH: usize = 2;
    const SILENCE: Self = 0;

    fn from_le_slice(bytes: &[u8]) -> Self {
        i16::from_le_bytes([bytes[0], bytes[1]])
    }

    fn scaled(self, gain: f32) -> Self {
        (self as f32 * gain) as i16
    }
}

impl PcmSample for i32 {
    const WIDTH: usize = 4;
    const SILENCE: Self = 0;

    fn from_le_slice(bytes: &[u8]) -> Self {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn scaled(self, gain: f32) -> Self {
        // f32 cannot hold every i32 exactly, f64 can
        (self as f64 * gain as f64) as i32
    }
}
