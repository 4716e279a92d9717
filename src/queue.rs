use crate::rtp::OutputFrame;

/// Default depth of the bounded frame FIFO bridging producer reader
/// task(s) to the consumer (spec.md §4.6). Ordering is strict insertion
/// order; a full queue applies back-pressure to the reader instead of
/// dropping frames.
pub const DEFAULT_CAPACITY: usize = 64;

pub type FrameSender = tokio::sync::mpsc::Sender<OutputFrame>;
pub type FrameReceiver = tokio::sync::mpsc::Receiver<OutputFrame>;

pub fn bounded(capacity: usize) -> (FrameSender, FrameReceiver) {
    tokio::sync::mpsc::channel(capacity)
}
