//! Protocol error codes and violation reports.
//!
//! A violation pairs an [`ErrCode`] with the byte offset of the offending
//! field or message, exactly what an `ERROR` reply frame needs to carry.
//! Host-API errors (would-block, closed session, …) are a separate surface
//! and live in `drawframe-core`.

use thiserror::Error;

/// Protocol error codes carried in `ERROR` reply payloads.
///
/// Reply `status` fields reuse the same space: the codes are the protocol's
/// only error vocabulary, for both dedicated error frames and per-request
/// status words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrCode {
    /// Success.
    Ok = 0,
    /// Malformed frame header; the accumulator is reset.
    InvalidFrame = 1,
    /// Malformed message header; dispatch of the frame stops.
    InvalidMsg = 2,
    /// Frame `version` field does not match the supported version.
    UnsupportedVersion = 3,
    /// Message type (or capability) the server does not implement.
    UnsupportedCap = 4,
    /// Operation not permitted.
    Permission = 5,
    /// Named object does not exist.
    NotFound = 6,
    /// Object is in use.
    Busy = 7,
    /// Allocation failed or a resource cap was hit.
    NoMemory = 8,
    /// Handle does not name a live object.
    InvalidHandle = 9,
    /// Operation is not valid in the current session state.
    InvalidState = 10,
    /// Request payload failed validation.
    InvalidArg = 11,
    /// Accumulated input exceeded the frame limit; input was discarded.
    Overflow = 12,
    /// I/O failure.
    Io = 13,
    /// Internal error.
    Internal = 14,
}

impl ErrCode {
    /// Wire representation.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    /// Reply `status` word carrying this code.
    #[must_use]
    pub const fn status(self) -> u32 {
        self as u32
    }
}

/// Frame-level protocol violation: the code for the `ERROR` reply plus the
/// offset of the offending header field within the frame.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("frame violation {code:?} at byte {offset}")]
pub struct FrameViolation {
    /// Error code to report.
    pub code: ErrCode,
    /// Byte offset of the offending field, from the start of the frame.
    pub offset: u32,
}

/// Message-level violation raised by the message walk.
///
/// Carries the `msg_id` parsed from the offending header so the error reply
/// can echo it, and the message's byte offset within the frame.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid message at byte {offset} (msg_id {msg_id})")]
pub struct MsgViolation {
    /// `msg_id` of the offending message header.
    pub msg_id: u32,
    /// Byte offset of the message within the frame.
    pub offset: u32,
}
