//! Packed frame and message headers.
//!
//! Both headers are fixed 16-byte structures serialized as raw
//! little-endian binary. Fields are stored as byte arrays and decoded
//! field-by-field through accessors, so parsing never depends on host
//! integer layout; `zerocopy` proves the casts from untrusted bytes are
//! well-defined (every bit pattern is a valid header candidate — semantic
//! validation happens separately in [`crate::frame`]).

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Fixed 16-byte frame header (little-endian).
///
/// Outermost container on the wire: `frame_bytes` covers the header itself
/// plus the 4-byte-aligned run of messages that follows.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    magic: [u8; 4],
    version: [u8; 2],
    header_bytes: [u8; 2],
    frame_bytes: [u8; 4],
    frame_id: [u8; 4],
}

impl FrameHeader {
    /// Size of the serialized header (16 bytes).
    pub const SIZE: usize = 16;

    /// Protocol magic: `"DRW1"` read as a little-endian u32.
    pub const MAGIC: u32 = 0x3157_5244;

    /// Current protocol version (major 1, minor 0).
    pub const VERSION: u16 = 0x0100;

    /// Byte offset of the `version` field.
    pub const OFF_VERSION: u32 = 4;

    /// Byte offset of the `header_bytes` field.
    pub const OFF_HEADER_BYTES: u32 = 6;

    /// Byte offset of the `frame_bytes` field.
    pub const OFF_FRAME_BYTES: u32 = 8;

    /// Byte offset of the `frame_id` field.
    pub const OFF_FRAME_ID: u32 = 12;

    /// Build an outbound header for a frame of `frame_bytes` total bytes.
    ///
    /// `frame_id` starts at 0; the session patches the real id in at
    /// enqueue time so delivery order always matches id order.
    #[must_use]
    pub fn new(frame_bytes: u32) -> Self {
        Self {
            magic: Self::MAGIC.to_le_bytes(),
            version: Self::VERSION.to_le_bytes(),
            header_bytes: (Self::SIZE as u16).to_le_bytes(),
            frame_bytes: frame_bytes.to_le_bytes(),
            frame_id: 0u32.to_le_bytes(),
        }
    }

    /// Borrow a header from the start of `bytes` without validation.
    ///
    /// `None` if fewer than [`Self::SIZE`] bytes are available. Semantic
    /// checks (magic, version, lengths) are the caller's business — the
    /// reassembly path and full validation apply different subsets.
    #[must_use]
    pub fn peek(bytes: &[u8]) -> Option<&Self> {
        Self::ref_from_prefix(bytes).ok().map(|(hdr, _)| hdr)
    }

    /// Serialize to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Protocol magic field.
    #[must_use]
    pub fn magic(&self) -> u32 {
        u32::from_le_bytes(self.magic)
    }

    /// Protocol version field.
    #[must_use]
    pub fn version(&self) -> u16 {
        u16::from_le_bytes(self.version)
    }

    /// Declared header length; must equal [`Self::SIZE`] on the wire.
    #[must_use]
    pub fn header_bytes(&self) -> u16 {
        u16::from_le_bytes(self.header_bytes)
    }

    /// Total frame length including this header.
    #[must_use]
    pub fn frame_bytes(&self) -> u32 {
        u32::from_le_bytes(self.frame_bytes)
    }

    /// Frame sequence id (monotonic per session on outbound frames).
    #[must_use]
    pub fn frame_id(&self) -> u32 {
        u32::from_le_bytes(self.frame_id)
    }

    /// Update the frame sequence id.
    pub fn set_frame_id(&mut self, frame_id: u32) {
        self.frame_id = frame_id.to_le_bytes();
    }
}

// Manual Debug: render decoded fields, not raw byte arrays.
impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("magic", &format_args!("{:#010x}", self.magic()))
            .field("version", &format_args!("{:#06x}", self.version()))
            .field("header_bytes", &self.header_bytes())
            .field("frame_bytes", &self.frame_bytes())
            .field("frame_id", &self.frame_id())
            .finish()
    }
}

impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FrameHeader {}

/// Fixed 16-byte message header (little-endian).
///
/// One per message inside a frame. `msg_bytes` is the unpadded logical
/// length including this header; the next message starts at the
/// 4-byte-aligned offset after it.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct MsgHeader {
    msg_type: [u8; 2],
    msg_flags: [u8; 2],
    msg_bytes: [u8; 4],
    msg_id: [u8; 4],
    reserved: [u8; 4],
}

impl MsgHeader {
    /// Size of the serialized header (16 bytes).
    pub const SIZE: usize = 16;

    /// Build an outbound message header.
    #[must_use]
    pub fn new(msg_type: u16, msg_bytes: u32, msg_id: u32) -> Self {
        Self {
            msg_type: msg_type.to_le_bytes(),
            msg_flags: 0u16.to_le_bytes(),
            msg_bytes: msg_bytes.to_le_bytes(),
            msg_id: msg_id.to_le_bytes(),
            reserved: 0u32.to_le_bytes(),
        }
    }

    /// Borrow a header from the start of `bytes` without validation.
    #[must_use]
    pub fn peek(bytes: &[u8]) -> Option<&Self> {
        Self::ref_from_prefix(bytes).ok().map(|(hdr, _)| hdr)
    }

    /// Serialize to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Message type code.
    #[must_use]
    pub fn msg_type(&self) -> u16 {
        u16::from_le_bytes(self.msg_type)
    }

    /// Message flags (currently unused; accepted as-is).
    #[must_use]
    pub fn msg_flags(&self) -> u16 {
        u16::from_le_bytes(self.msg_flags)
    }

    /// Unpadded message length including this header.
    #[must_use]
    pub fn msg_bytes(&self) -> u32 {
        u32::from_le_bytes(self.msg_bytes)
    }

    /// Caller correlation id, echoed in replies.
    #[must_use]
    pub fn msg_id(&self) -> u32 {
        u32::from_le_bytes(self.msg_id)
    }

    /// Reserved field. Not enforced zero on requests.
    #[must_use]
    pub fn reserved(&self) -> u32 {
        u32::from_le_bytes(self.reserved)
    }
}

impl std::fmt::Debug for MsgHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MsgHeader")
            .field("msg_type", &format_args!("{:#06x}", self.msg_type()))
            .field("msg_flags", &self.msg_flags())
            .field("msg_bytes", &self.msg_bytes())
            .field("msg_id", &self.msg_id())
            .finish()
    }
}

impl PartialEq for MsgHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for MsgHeader {}
