//! Fixed-layout message payloads.
//!
//! Every payload is a packed little-endian record serialized field by
//! field — never by casting host structs. [`Wire`] writes a payload into an
//! outbound frame; [`Parse`] reads one from a message's payload bytes and
//! reports "too short" as `None` (the dispatcher decides whether that is an
//! `INVALID_ARG` error frame or an in-reply status, per message type).
//!
//! Reply `status` words use the [`crate::ErrCode`] space; `0` is success.

mod display;
mod session;
mod surface;

use bytes::BytesMut;

pub use display::{DisplayDesc, DisplayListRep, DisplayOpenRep, DisplayOpenReq};
pub use session::{ErrorRep, HelloRep, HelloReq};
pub use surface::{
    PixelFormat, SurfaceCreateRep, SurfaceCreateReq, SurfaceDestroyRep, SurfaceDestroyReq,
    SurfacePresentRep, SurfacePresentReq, SurfacePresentedEvt,
};

/// Serialize a payload into an outbound frame.
pub trait Wire {
    /// Encoded length in bytes (unpadded; the frame builder pads).
    fn wire_bytes(&self) -> usize;

    /// Append the encoded payload.
    fn put(&self, dst: &mut BytesMut);
}

/// Raw pass-through payload: the bytes go on the wire as-is.
impl Wire for Vec<u8> {
    fn wire_bytes(&self) -> usize {
        self.len()
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.extend_from_slice(self);
    }
}

/// Parse a payload from a message's payload bytes.
///
/// Trailing bytes beyond the fixed part are ignored, which keeps old
/// servers compatible with extended requests.
pub trait Parse: Sized {
    /// Length of the fixed part; shorter payloads parse to `None`.
    const FIXED_BYTES: usize;

    /// Decode the fixed part. `None` if `payload` is shorter than it.
    fn parse(payload: &[u8]) -> Option<Self>;
}
