//! Host-API error surface.
//!
//! Protocol violations never surface here — they become `ERROR` reply
//! frames and the session keeps running. This enum is what the device entry
//! points themselves return: the conditions the host maps to errno-style
//! results. No variant is fatal to the session other than [`DeviceError::Closed`].

use thiserror::Error;

/// Errors returned by device entry points (read/write/poll/control/map).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// The session is closing or closed (no-such-device).
    #[error("session is closed")]
    Closed,

    /// Non-blocking read found the event queue empty (would-block).
    #[error("no event queued")]
    WouldBlock,

    /// A single write exceeded the frame limit (too-big). Rejected at the
    /// device boundary before touching the accumulator.
    #[error("write exceeds the frame limit")]
    TooBig,

    /// No surface is selected for mapping, or the selected surface is gone
    /// (not-found).
    #[error("no mappable surface")]
    NotFound,

    /// Mapping argument out of range: nonzero offset, zero size, or size
    /// beyond the surface's total bytes (invalid-arg).
    #[error("invalid mapping argument")]
    InvalidArg,

    /// Backing-store allocation failed (out-of-memory).
    #[error("backing-store allocation failed")]
    NoMemory,
}
