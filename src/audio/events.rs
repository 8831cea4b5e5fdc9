// Events reported by the audio callback
//
// The callback may not log or allocate, so anything worth telling the user
// goes through a fixed-size lock-free queue and is logged by the control loop.

use ringbuf::traits::Split;
use ringbuf::HeapRb;
use std::io::ErrorKind;

/// Room for events between two drains of the control loop
pub const EVENT_QUEUE_CAPACITY: usize = 64;

pub type EventProducer = ringbuf::HeapProd<TransportEvent>;
pub type EventConsumer = ringbuf::HeapCons<TransportEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// End of stream reached with looping on; `at` is where the period started
    Looped { at: i64 },
    /// End of stream reached with looping off; playback paused
    Finished { at: i64 },
    /// A read failed and was treated as end of stream
    ReadFailed { at: i64, kind: ErrorKind },
}

/// Create the queue; the producer half goes to the audio callback
pub fn event_queue() -> (EventProducer, EventConsumer) {
    HeapRb::<TransportEvent>::new(EVENT_QUEUE_CAPACITY).split()
}
