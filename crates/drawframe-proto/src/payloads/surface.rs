//! Surface lifecycle payloads.

use bytes::{Buf, BufMut, BytesMut};

use super::{Parse, Wire};

/// Pixel formats a surface can carry.
///
/// The only supported format is 32-bit XRGB: 8 bits per channel, one
/// padding byte, stride = width × 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PixelFormat {
    /// 32-bit XRGB, little-endian channel order.
    Xrgb8888 = 1,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub const BYTES_PER_PIXEL: u32 = 4;

    /// Wire representation.
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    /// Parse a wire format code.
    #[must_use]
    pub const fn from_u32(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Xrgb8888),
            _ => None,
        }
    }
}

/// `SURFACE_CREATE` request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCreateReq {
    /// Surface width in pixels; must be nonzero.
    pub width_px: u32,
    /// Surface height in pixels; must be nonzero.
    pub height_px: u32,
    /// Pixel format code ([`PixelFormat`]).
    pub format: u32,
    /// Reserved flags.
    pub flags: u32,
}

impl Wire for SurfaceCreateReq {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.width_px);
        dst.put_u32_le(self.height_px);
        dst.put_u32_le(self.format);
        dst.put_u32_le(self.flags);
    }
}

impl Parse for SurfaceCreateReq {
    const FIXED_BYTES: usize = 16;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self {
            width_px: payload.get_u32_le(),
            height_px: payload.get_u32_le(),
            format: payload.get_u32_le(),
            flags: payload.get_u32_le(),
        })
    }
}

/// `SURFACE_CREATE` reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCreateRep {
    /// 0 on success, else an [`crate::ErrCode`] value.
    pub status: u32,
    /// Freshly allocated surface id; 0 on failure.
    pub surface_id: u32,
    /// Row stride in bytes (width × 4); 0 on failure.
    pub stride_bytes: u32,
    /// Total backing-store size (stride × height); 0 on failure.
    pub bytes_total: u32,
}

impl Wire for SurfaceCreateRep {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.status);
        dst.put_u32_le(self.surface_id);
        dst.put_u32_le(self.stride_bytes);
        dst.put_u32_le(self.bytes_total);
    }
}

impl Parse for SurfaceCreateRep {
    const FIXED_BYTES: usize = 16;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self {
            status: payload.get_u32_le(),
            surface_id: payload.get_u32_le(),
            stride_bytes: payload.get_u32_le(),
            bytes_total: payload.get_u32_le(),
        })
    }
}

/// `SURFACE_DESTROY` request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDestroyReq {
    /// Surface to destroy; 0 is never valid.
    pub surface_id: u32,
}

impl Wire for SurfaceDestroyReq {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.surface_id);
    }
}

impl Parse for SurfaceDestroyReq {
    const FIXED_BYTES: usize = 4;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self { surface_id: payload.get_u32_le() })
    }
}

/// `SURFACE_DESTROY` reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDestroyRep {
    /// 0 on success, else an [`crate::ErrCode`] value.
    pub status: u32,
    /// Echo of the requested surface id.
    pub surface_id: u32,
}

impl Wire for SurfaceDestroyRep {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.status);
        dst.put_u32_le(self.surface_id);
    }
}

impl Parse for SurfaceDestroyRep {
    const FIXED_BYTES: usize = 8;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self { status: payload.get_u32_le(), surface_id: payload.get_u32_le() })
    }
}

/// Reserved `SURFACE_PRESENT` request body.
///
/// The code is allocated but the server answers `UNSUPPORTED_CAP`; the
/// shape is published for forward compatibility only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePresentReq {
    /// Surface to present.
    pub surface_id: u32,
    /// Reserved flags (vsync, damage, …).
    pub flags: u32,
    /// Caller cookie echoed by the completion event.
    pub cookie: u64,
}

impl Wire for SurfacePresentReq {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.surface_id);
        dst.put_u32_le(self.flags);
        dst.put_u64_le(self.cookie);
    }
}

impl Parse for SurfacePresentReq {
    const FIXED_BYTES: usize = 16;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self {
            surface_id: payload.get_u32_le(),
            flags: payload.get_u32_le(),
            cookie: payload.get_u64_le(),
        })
    }
}

/// Reserved `SURFACE_PRESENT` reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePresentRep {
    /// 0 on success, else an [`crate::ErrCode`] value.
    pub status: u32,
    /// Echo of the requested surface id.
    pub surface_id: u32,
    /// Echo of the request cookie.
    pub cookie: u64,
}

impl Wire for SurfacePresentRep {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.status);
        dst.put_u32_le(self.surface_id);
        dst.put_u64_le(self.cookie);
    }
}

impl Parse for SurfacePresentRep {
    const FIXED_BYTES: usize = 16;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self {
            status: payload.get_u32_le(),
            surface_id: payload.get_u32_le(),
            cookie: payload.get_u64_le(),
        })
    }
}

/// Reserved `SURFACE_PRESENTED` event body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePresentedEvt {
    /// Surface that completed presentation.
    pub surface_id: u32,
    /// Reserved.
    pub reserved: u32,
    /// Cookie from the originating request.
    pub cookie: u64,
}

impl Wire for SurfacePresentedEvt {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.surface_id);
        dst.put_u32_le(self.reserved);
        dst.put_u64_le(self.cookie);
    }
}

impl Parse for SurfacePresentedEvt {
    const FIXED_BYTES: usize = 16;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self {
            surface_id: payload.get_u32_le(),
            reserved: payload.get_u32_le(),
            cookie: payload.get_u64_le(),
        })
    }
}
