//! Session counters and the stats control-op snapshot.

/// Live counters, guarded by the session lock. All monotonic.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Counters {
    pub(crate) frames_received: u64,
    pub(crate) frames_processed: u64,
    pub(crate) frames_invalid: u64,
    pub(crate) messages_processed: u64,
    pub(crate) messages_unsupported: u64,
    pub(crate) events_enqueued: u64,
    pub(crate) events_dropped: u64,
    pub(crate) bytes_in: u64,
    pub(crate) bytes_out: u64,
}

/// Point-in-time copy of a session's counters (the stats control op).
///
/// The u64 counters are monotonic non-decreasing for the session's
/// lifetime; `evq_depth` and `inbuf_bytes` are instantaneous.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames recognised in the accumulator (valid or not).
    pub frames_received: u64,
    /// Frames that passed validation and were dispatched.
    pub frames_processed: u64,
    /// Frames rejected by provisional or full validation.
    pub frames_invalid: u64,
    /// Messages dispatched, including unsupported ones.
    pub messages_processed: u64,
    /// Messages whose type the server does not implement.
    pub messages_unsupported: u64,
    /// Frames successfully enqueued for the reader.
    pub events_enqueued: u64,
    /// Enqueue attempts after the session entered the closing state.
    pub events_dropped: u64,
    /// Payload bytes accepted by `write`.
    pub bytes_in: u64,
    /// Bytes enqueued for the reader.
    pub bytes_out: u64,
    /// Current event-queue depth in frames.
    pub evq_depth: u32,
    /// Current accumulator length in bytes.
    pub inbuf_bytes: u32,
}

impl Counters {
    /// Snapshot the counters, attaching the instantaneous gauges.
    pub(crate) fn snapshot(&self, evq_depth: u32, inbuf_bytes: u32) -> StatsSnapshot {
        StatsSnapshot {
            frames_received: self.frames_received,
            frames_processed: self.frames_processed,
            frames_invalid: self.frames_invalid,
            messages_processed: self.messages_processed,
            messages_unsupported: self.messages_unsupported,
            events_enqueued: self.events_enqueued,
            events_dropped: self.events_dropped,
            bytes_in: self.bytes_in,
            bytes_out: self.bytes_out,
            evq_depth,
            inbuf_bytes,
        }
    }
}
