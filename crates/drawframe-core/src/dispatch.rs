//! Request dispatch: one handler per message type, all synchronous
//! producers into the event queue.
//!
//! Handlers take the session lock only around state mutation; reply frames
//! are built and enqueued afterwards. Every reply echoes the request's
//! `msg_id`; `frame_id` is assigned at enqueue. Short payloads are an
//! `INVALID_ARG` *error frame* for `HELLO` but an in-reply *status* for the
//! display and surface requests, matching the wire contract request by
//! request.

use drawframe_proto::{
    ErrCode, MsgType,
    frame::{Message, ValidFrame},
    payloads::{
        DisplayDesc, DisplayListRep, DisplayOpenRep, DisplayOpenReq, ErrorRep, HelloRep, HelloReq,
        Parse, PixelFormat, SurfaceCreateRep, SurfaceCreateReq, SurfaceDestroyRep,
        SurfaceDestroyReq,
    },
};

use crate::{
    session::Session,
    surface::SurfaceLimit,
};

/// The one display the stub enumeration backend reports.
const STUB_DISPLAY: DisplayDesc =
    DisplayDesc { display_id: 1, width_px: 1920, height_px: 1080, refresh_mhz: 60_000, flags: 0 };

impl Session {
    /// Dispatch every message of a validated frame, in wire order.
    ///
    /// A malformed message header produces one `INVALID_MSG` error reply
    /// and stops dispatch of the rest of the frame.
    pub(crate) fn process_frame(&self, valid: &ValidFrame<'_>) {
        for item in valid.messages() {
            match item {
                Err(v) => {
                    self.reply_error(v.msg_id, ErrCode::InvalidMsg, v.offset);
                    return;
                }
                Ok(msg) => {
                    self.lock().stats.messages_processed += 1;
                    self.dispatch(&msg);
                }
            }
        }
    }

    fn dispatch(&self, msg: &Message<'_>) {
        tracing::debug!(msg_type = msg.msg_type(), msg_id = msg.msg_id(), "dispatch");
        match MsgType::request_from_u16(msg.msg_type()) {
            Some(MsgType::Hello) => self.on_hello(msg),
            Some(MsgType::DisplayList) => self.on_display_list(msg),
            Some(MsgType::DisplayOpen) => self.on_display_open(msg),
            Some(MsgType::SurfaceCreate) => self.on_surface_create(msg),
            Some(MsgType::SurfaceDestroy) => self.on_surface_destroy(msg),
            // SURFACE_PRESENT is reserved and unknown types are counted the
            // same way
            _ => {
                self.lock().stats.messages_unsupported += 1;
                tracing::debug!(msg_type = msg.msg_type(), "unsupported message type");
                self.reply_error(msg.msg_id(), ErrCode::UnsupportedCap, msg.offset());
            }
        }
    }

    /// Emit one `ERROR` reply frame.
    pub(crate) fn reply_error(&self, msg_id: u32, code: ErrCode, offset: u32) {
        let payload = ErrorRep { err_code: code.to_u32(), err_detail: 0, err_offset: offset };
        self.reply(MsgType::RplError, msg_id, &payload);
    }

    fn on_hello(&self, msg: &Message<'_>) {
        // The fixed part must be present even though its content is unused
        if HelloReq::parse(msg.payload()).is_none() {
            self.reply_error(msg.msg_id(), ErrCode::InvalidArg, msg.offset());
            return;
        }
        let rep = HelloRep { server_major: 1, server_minor: 0, server_flags: 0, caps_bytes: 0 };
        self.reply(MsgType::RplHello, msg.msg_id(), &rep);
    }

    fn on_display_list(&self, msg: &Message<'_>) {
        let rep = DisplayListRep { displays: vec![STUB_DISPLAY] };
        self.reply(MsgType::RplDisplayList, msg.msg_id(), &rep);
    }

    fn on_display_open(&self, msg: &Message<'_>) {
        let mut rep = DisplayOpenRep { status: 0, display_handle: 0, active_display_id: 0 };

        match DisplayOpenReq::parse(msg.payload()) {
            None => rep.status = ErrCode::InvalidArg.status(),
            Some(req) if req.display_id != STUB_DISPLAY.display_id => {
                rep.status = ErrCode::NotFound.status();
            }
            Some(req) => {
                let mut st = self.lock();
                st.active_display_id = req.display_id;
                // Idempotent: a re-open keeps the existing handle
                if st.active_display_handle == 0 {
                    st.active_display_handle = st.next_display_handle;
                    st.next_display_handle += 1;
                }
                rep.display_handle = st.active_display_handle;
                rep.active_display_id = st.active_display_id;
            }
        }

        self.reply(MsgType::RplDisplayOpen, msg.msg_id(), &rep);
    }

    fn on_surface_create(&self, msg: &Message<'_>) {
        let rep = self.create_surface(msg.payload());
        self.reply(MsgType::RplSurfaceCreate, msg.msg_id(), &rep);
    }

    fn create_surface(&self, payload: &[u8]) -> SurfaceCreateRep {
        let failure = |code: ErrCode| SurfaceCreateRep {
            status: code.status(),
            surface_id: 0,
            stride_bytes: 0,
            bytes_total: 0,
        };

        let mut st = self.lock();
        if st.active_display_id == 0 {
            return failure(ErrCode::InvalidArg);
        }
        let Some(req) = SurfaceCreateReq::parse(payload) else {
            return failure(ErrCode::InvalidArg);
        };
        if req.width_px == 0 || req.height_px == 0 {
            return failure(ErrCode::InvalidArg);
        }
        let Some(format) = PixelFormat::from_u32(req.format) else {
            return failure(ErrCode::UnsupportedCap);
        };

        match st.surfaces.create(req.width_px, req.height_px, format) {
            Ok(created) => {
                tracing::debug!(
                    surface_id = created.id,
                    bytes_total = created.bytes_total,
                    session_bytes = st.surfaces.bytes_live(),
                    "surface created"
                );
                SurfaceCreateRep {
                    status: ErrCode::Ok.status(),
                    surface_id: created.id,
                    stride_bytes: created.stride_bytes,
                    bytes_total: created.bytes_total,
                }
            }
            Err(SurfaceLimit::Oversized) => failure(ErrCode::InvalidArg),
            Err(SurfaceLimit::CapExceeded) => failure(ErrCode::NoMemory),
        }
    }

    fn on_surface_destroy(&self, msg: &Message<'_>) {
        let rep = self.destroy_surface(msg.payload());
        self.reply(MsgType::RplSurfaceDestroy, msg.msg_id(), &rep);
    }

    fn destroy_surface(&self, payload: &[u8]) -> SurfaceDestroyRep {
        let Some(req) = SurfaceDestroyReq::parse(payload) else {
            return SurfaceDestroyRep { status: ErrCode::InvalidArg.status(), surface_id: 0 };
        };
        if req.surface_id == 0 {
            return SurfaceDestroyRep {
                status: ErrCode::InvalidArg.status(),
                surface_id: req.surface_id,
            };
        }

        let mut st = self.lock();
        match st.surfaces.remove(req.surface_id) {
            Some(surface) => {
                // The record's buffer reference drops with it; the object
                // persists for outstanding mappings
                if st.map_surface_id == req.surface_id {
                    st.map_surface_id = 0;
                }
                tracing::debug!(
                    surface_id = surface.id,
                    width_px = surface.width_px,
                    height_px = surface.height_px,
                    format = ?surface.format,
                    "surface destroyed"
                );
                SurfaceDestroyRep { status: ErrCode::Ok.status(), surface_id: req.surface_id }
            }
            None => SurfaceDestroyRep {
                status: ErrCode::NotFound.status(),
                surface_id: req.surface_id,
            },
        }
    }
}
