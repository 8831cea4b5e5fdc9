// Audio streaming module
// Raw PCM source -> transport state -> frame producer -> cpal output

pub mod events;
pub mod format;
pub mod output;
pub mod producer;
pub mod sample;
pub mod source;
pub mod transport;

pub use format::StreamFormat;
pub use output::{CpalOutput, ManualOutput, OutputDriver};
pub use producer::FrameProducer;
pub use source::SourceReader;
pub use transport::TransportState;
