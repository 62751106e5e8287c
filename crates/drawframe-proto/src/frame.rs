//! Inbound frame validation, the message walk, and outbound construction.
//!
//! Inbound bytes pass through two gates. [`peek`] runs over the session's
//! reassembly accumulator and answers one question cheaply: is a complete
//! frame available, is more input needed, or is the header hopeless (reset
//! the accumulator)? [`validate`] then runs the full checks over an
//! extracted frame in the canonical order (magic, version, header length,
//! frame length) and yields a [`ValidFrame`] whose [`Messages`] iterator
//! performs the 4-byte-aligned message walk.
//!
//! `peek` deliberately does not check `version`: the frame must first be
//! extracted whole so the error reply can point at the right offset, which
//! is full validation's job. A complete frame shorter than one header is
//! extracted and then rejected with offset 0, matching the reassembly
//! contract.

use bytes::BytesMut;

use crate::{
    ErrCode, FrameHeader, MAX_FRAME_BYTES, MAX_MSG_BYTES, MsgHeader, MsgType, align4,
    errors::{FrameViolation, MsgViolation},
    payloads::Wire,
};

/// Outcome of a provisional header check over accumulated bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peek {
    /// Not enough bytes for a verdict; keep accumulating.
    NeedMore,
    /// A complete frame of `len` bytes is available.
    Frame {
        /// Total frame length in bytes.
        len: usize,
    },
    /// The header can never become a valid frame; reset the accumulator.
    Bad(FrameViolation),
}

/// Provisionally check the accumulator for a complete frame.
#[must_use]
pub fn peek(buf: &[u8]) -> Peek {
    let Some(hdr) = FrameHeader::peek(buf) else {
        return Peek::NeedMore;
    };

    if hdr.magic() != FrameHeader::MAGIC {
        return Peek::Bad(FrameViolation { code: ErrCode::InvalidFrame, offset: 0 });
    }

    if hdr.header_bytes() as usize != FrameHeader::SIZE {
        return Peek::Bad(FrameViolation {
            code: ErrCode::InvalidFrame,
            offset: FrameHeader::OFF_HEADER_BYTES,
        });
    }

    let frame_bytes = hdr.frame_bytes();
    if frame_bytes == 0 || frame_bytes > MAX_FRAME_BYTES || frame_bytes % 4 != 0 {
        return Peek::Bad(FrameViolation {
            code: ErrCode::InvalidFrame,
            offset: FrameHeader::OFF_FRAME_BYTES,
        });
    }

    if buf.len() < frame_bytes as usize {
        return Peek::NeedMore;
    }

    Peek::Frame { len: frame_bytes as usize }
}

/// Fully validate an extracted frame.
///
/// Checks run in the canonical order so `err_offset` always names the first
/// offending field: magic (offset 0), version (4), header length (6), frame
/// length (8: below header size, beyond the received bytes, or misaligned).
///
/// # Errors
///
/// [`FrameViolation`] carrying the `ERROR`-reply code and offset.
pub fn validate(buf: &[u8]) -> Result<ValidFrame<'_>, FrameViolation> {
    let Some(hdr) = FrameHeader::peek(buf) else {
        return Err(FrameViolation { code: ErrCode::InvalidFrame, offset: 0 });
    };

    if hdr.magic() != FrameHeader::MAGIC {
        return Err(FrameViolation { code: ErrCode::InvalidFrame, offset: 0 });
    }

    if hdr.version() != FrameHeader::VERSION {
        return Err(FrameViolation {
            code: ErrCode::UnsupportedVersion,
            offset: FrameHeader::OFF_VERSION,
        });
    }

    if hdr.header_bytes() as usize != FrameHeader::SIZE {
        return Err(FrameViolation {
            code: ErrCode::InvalidFrame,
            offset: FrameHeader::OFF_HEADER_BYTES,
        });
    }

    let frame_bytes = hdr.frame_bytes();
    if (frame_bytes as usize) < FrameHeader::SIZE
        || frame_bytes as usize > buf.len()
        || frame_bytes % 4 != 0
    {
        return Err(FrameViolation {
            code: ErrCode::InvalidFrame,
            offset: FrameHeader::OFF_FRAME_BYTES,
        });
    }

    Ok(ValidFrame { buf, frame_bytes: frame_bytes as usize })
}

/// A frame whose header passed full validation.
///
/// Borrowed view; messages are walked lazily through [`ValidFrame::messages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidFrame<'a> {
    buf: &'a [u8],
    frame_bytes: usize,
}

impl<'a> ValidFrame<'a> {
    /// Frame sequence id from the header.
    #[must_use]
    pub fn frame_id(&self) -> u32 {
        FrameHeader::peek(self.buf).map_or(0, FrameHeader::frame_id)
    }

    /// Total frame length in bytes.
    #[must_use]
    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }

    /// Iterate over the frame's messages in wire order.
    #[must_use]
    pub fn messages(&self) -> Messages<'a> {
        Messages { buf: self.buf, pos: FrameHeader::SIZE, end: self.frame_bytes, done: false }
    }
}

/// One message borrowed from a validated frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    hdr: MsgHeader,
    payload: &'a [u8],
    offset: u32,
}

impl<'a> Message<'a> {
    /// Raw message type code.
    #[must_use]
    pub fn msg_type(&self) -> u16 {
        self.hdr.msg_type()
    }

    /// Caller correlation id.
    #[must_use]
    pub fn msg_id(&self) -> u32 {
        self.hdr.msg_id()
    }

    /// Payload bytes after the message header.
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Byte offset of this message within its frame.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// Iterator performing the aligned message walk.
///
/// Yields messages until fewer than one message header remains before the
/// frame end (trailing runt bytes silently end the walk). A malformed
/// message header yields exactly one `Err` and fuses the iterator: dispatch
/// of the frame stops at the bad message.
#[derive(Debug)]
pub struct Messages<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
    done: bool,
}

impl<'a> Iterator for Messages<'a> {
    type Item = Result<Message<'a>, MsgViolation>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos + MsgHeader::SIZE > self.end {
            self.done = true;
            return None;
        }

        let offset = self.pos as u32;
        let Some(hdr) = MsgHeader::peek(&self.buf[self.pos..self.end]) else {
            self.done = true;
            return None;
        };
        let hdr = *hdr;

        let msg_bytes = hdr.msg_bytes();
        let violation = msg_bytes < MsgHeader::SIZE as u32
            || msg_bytes > MAX_MSG_BYTES
            || self.pos + msg_bytes as usize > self.end;
        if violation {
            self.done = true;
            return Some(Err(MsgViolation { msg_id: hdr.msg_id(), offset }));
        }

        let payload = &self.buf[self.pos + MsgHeader::SIZE..self.pos + msg_bytes as usize];
        self.pos += align4(msg_bytes) as usize;

        Some(Ok(Message { hdr, payload, offset }))
    }
}

/// Builder for outbound frames.
///
/// Writes the frame header up front with `frame_id = 0`, appends messages
/// (header, payload, zero padding to the 4-byte boundary — `msg_bytes`
/// stays unpadded), and patches `frame_bytes` on [`FrameBuilder::finish`].
/// The session assigns the real `frame_id` with [`set_frame_id`] when the
/// frame is enqueued.
#[derive(Debug)]
pub struct FrameBuilder {
    buf: BytesMut,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuilder {
    /// Start a frame.
    #[must_use]
    pub fn new() -> Self {
        let mut buf = BytesMut::with_capacity(64);
        buf.extend_from_slice(&FrameHeader::new(0).to_bytes());
        Self { buf }
    }

    /// Append one message.
    pub fn message<P: Wire>(&mut self, msg_type: MsgType, msg_id: u32, payload: &P) -> &mut Self {
        let msg_bytes = (MsgHeader::SIZE + payload.wire_bytes()) as u32;
        self.buf.extend_from_slice(&MsgHeader::new(msg_type.to_u16(), msg_bytes, msg_id).to_bytes());
        payload.put(&mut self.buf);

        let pad = (align4(msg_bytes) - msg_bytes) as usize;
        self.buf.extend_from_slice(&[0u8; 3][..pad]);
        self
    }

    /// Patch `frame_bytes` and hand back the finished frame.
    #[must_use]
    pub fn finish(self) -> BytesMut {
        let mut buf = self.buf;
        let len = buf.len() as u32;
        let off = FrameHeader::OFF_FRAME_BYTES as usize;
        buf[off..off + 4].copy_from_slice(&len.to_le_bytes());
        buf
    }
}

/// Patch the `frame_id` field of a serialized frame in place.
///
/// No-op on buffers shorter than a frame header.
pub fn set_frame_id(frame: &mut [u8], frame_id: u32) {
    let off = FrameHeader::OFF_FRAME_ID as usize;
    if let Some(slot) = frame.get_mut(off..off + 4) {
        slot.copy_from_slice(&frame_id.to_le_bytes());
    }
}
