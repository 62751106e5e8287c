//! Display enumeration and binding payloads.

use bytes::{Buf, BufMut, BytesMut};

use super::{Parse, Wire};

/// One display in a `DISPLAY_LIST` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayDesc {
    /// Display id; ids start at 1.
    pub display_id: u32,
    /// Active mode width in pixels.
    pub width_px: u32,
    /// Active mode height in pixels.
    pub height_px: u32,
    /// Refresh rate in millihertz (60000 = 60.000 Hz).
    pub refresh_mhz: u32,
    /// Reserved flags.
    pub flags: u32,
}

impl Wire for DisplayDesc {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.display_id);
        dst.put_u32_le(self.width_px);
        dst.put_u32_le(self.height_px);
        dst.put_u32_le(self.refresh_mhz);
        dst.put_u32_le(self.flags);
    }
}

impl Parse for DisplayDesc {
    const FIXED_BYTES: usize = 20;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self {
            display_id: payload.get_u32_le(),
            width_px: payload.get_u32_le(),
            height_px: payload.get_u32_le(),
            refresh_mhz: payload.get_u32_le(),
            flags: payload.get_u32_le(),
        })
    }
}

/// `DISPLAY_LIST` reply body: a count followed by that many descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayListRep {
    /// Descriptors in id order.
    pub displays: Vec<DisplayDesc>,
}

impl DisplayListRep {
    /// Decode a full reply payload, including the descriptor run.
    ///
    /// `None` if the payload is shorter than the count claims.
    #[must_use]
    pub fn decode(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < 4 {
            return None;
        }
        let count = payload.get_u32_le() as usize;
        let mut displays = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            if payload.len() < DisplayDesc::FIXED_BYTES {
                return None;
            }
            let desc = DisplayDesc::parse(payload)?;
            payload.advance(DisplayDesc::FIXED_BYTES);
            displays.push(desc);
        }
        Some(Self { displays })
    }
}

impl Wire for DisplayListRep {
    fn wire_bytes(&self) -> usize {
        4 + self.displays.len() * DisplayDesc::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.displays.len() as u32);
        for desc in &self.displays {
            desc.put(dst);
        }
    }
}

/// `DISPLAY_OPEN` request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOpenReq {
    /// Display to bind the session to.
    pub display_id: u32,
}

impl Wire for DisplayOpenReq {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.display_id);
    }
}

impl Parse for DisplayOpenReq {
    const FIXED_BYTES: usize = 4;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self { display_id: payload.get_u32_le() })
    }
}

/// `DISPLAY_OPEN` reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOpenRep {
    /// 0 on success, else an [`crate::ErrCode`] value.
    pub status: u32,
    /// Session-unique display handle; 0 on failure.
    pub display_handle: u32,
    /// Display the session is now bound to; 0 on failure.
    pub active_display_id: u32,
}

impl Wire for DisplayOpenRep {
    fn wire_bytes(&self) -> usize {
        Self::FIXED_BYTES
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.put_u32_le(self.status);
        dst.put_u32_le(self.display_handle);
        dst.put_u32_le(self.active_display_id);
    }
}

impl Parse for DisplayOpenRep {
    const FIXED_BYTES: usize = 12;

    fn parse(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::FIXED_BYTES {
            return None;
        }
        Some(Self {
            status: payload.get_u32_le(),
            display_handle: payload.get_u32_le(),
            active_display_id: payload.get_u32_le(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_list_round_trip() {
        let rep = DisplayListRep {
            displays: vec![DisplayDesc {
                display_id: 1,
                width_px: 1920,
                height_px: 1080,
                refresh_mhz: 60000,
                flags: 0,
            }],
        };
        let mut buf = BytesMut::new();
        rep.put(&mut buf);
        assert_eq!(buf.len(), 24);
        assert_eq!(DisplayListRep::decode(&buf), Some(rep));
    }

    #[test]
    fn display_list_rejects_truncated_descriptor_run() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(2);
        DisplayDesc { display_id: 1, width_px: 1, height_px: 1, refresh_mhz: 1, flags: 0 }
            .put(&mut buf);
        assert_eq!(DisplayListRep::decode(&buf), None);
    }
}
