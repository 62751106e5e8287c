//! Handshake and error payloads.

use bytes::{Buf, BufMut, BytesMut};

use super::{Parse, Wire};

/// `HELLO` request body.
///
/// The server currently ignores the advertised client version and limits;
/// the fixed part must still be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloReq {
    /// Client protocol major version.
    pub client_major: u16,
    /// Client protocol minor version.
    pub client_minor: u16,
    /// Client feature flags (reserved).
    pub client_flags: u32,
    /// Largest reply frame the client is prepared to read.
    pub max_reply_bytes: u32,
}

impl Wire for HelloReq {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u16_le(self.client_major);
        dst.put_u16_le(self.client_minor);
        dst.put_u32_le(self.client_flags);
        dst.put_u32_le(self.max_reply_bytes);
    }
}

impl Parse for HelloReq {
    const FIXED_BYTES: usize = 12;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self {
            client_major: payload.get_u16_le(),
            client_minor: payload.get_u16_le(),
            client_flags: payload.get_u32_le(),
            max_reply_bytes: payload.get_u32_le(),
        })
    }
}

/// `HELLO` reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloRep {
    /// Server protocol major version.
    pub server_major: u16,
    /// Server protocol minor version.
    pub server_minor: u16,
    /// Server feature flags (currently 0).
    pub server_flags: u32,
    /// Length of the capability blob after the fixed part (currently 0).
    pub caps_bytes: u32,
}

impl Wire for HelloRep {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u16_le(self.server_major);
        dst.put_u16_le(self.server_minor);
        dst.put_u32_le(self.server_flags);
        dst.put_u32_le(self.caps_bytes);
    }
}

impl Parse for HelloRep {
    const FIXED_BYTES: usize = 12;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self {
            server_major: payload.get_u16_le(),
            server_minor: payload.get_u16_le(),
            server_flags: payload.get_u32_le(),
            caps_bytes: payload.get_u32_le(),
        })
    }
}

/// `ERROR` reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorRep {
    /// Protocol error code ([`crate::ErrCode`]).
    pub err_code: u32,
    /// Secondary detail word (currently 0).
    pub err_detail: u32,
    /// Byte offset of the offending field or message.
    pub err_offset: u32,
}

impl Wire for ErrorRep {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.err_code);
        dst.put_u32_le(self.err_detail);
        dst.put_u32_le(self.err_offset);
    }
}

impl Parse for ErrorRep {
    const FIXED_BYTES: usize = 12;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self {
            err_code: payload.get_u32_le(),
            err_detail: payload.get_u32_le(),
            err_offset: payload.get_u32_le(),
        })
    }
}
