//! Per-open session: state, lock, wait channel, and the engine's entry
//! points.
//!
//! One coarse lock serialises every mutation of the accumulator, event
//! queue, surface table, display binding, map selection, and counters.
//! Frame validation, dispatch, and buffer allocation run with the lock
//! released; only the read path ever sleeps, on the condvar, and close
//! wakes it deterministically.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use bytes::{Bytes, BytesMut};
use drawframe_proto::{ErrCode, MsgType, Peek, frame, payloads::Wire};

use crate::{
    buffer::{BufferAllocator, Mapping},
    error::DeviceError,
    eventq::EventQueue,
    readiness::{PollState, Readiness, ReadyWaker},
    stats::{Counters, StatsSnapshot},
    surface::{MapSurface, SurfaceTable},
};

/// Initial accumulator capacity in bytes.
const INBUF_CAPACITY: usize = 4096;

/// Session state guarded by the coarse lock.
pub(crate) struct State {
    pub(crate) inbuf: BytesMut,
    pub(crate) evq: EventQueue,
    pub(crate) readiness: Readiness,
    pub(crate) closing: bool,
    pub(crate) next_out_frame_id: u32,
    pub(crate) active_display_id: u32,
    pub(crate) active_display_handle: u32,
    pub(crate) next_display_handle: u32,
    pub(crate) map_surface_id: u32,
    pub(crate) surfaces: SurfaceTable,
    pub(crate) stats: Counters,
}

/// Per-open protocol engine.
///
/// Exclusively owned by one open of the device node; concurrent readers,
/// writers, pollers, and mappers on that open all funnel through the
/// session lock. Created with [`Session::open`], torn down by
/// [`Session::shutdown`].
pub struct Session {
    state: Mutex<State>,
    cv: Condvar,
    allocator: Arc<dyn BufferAllocator>,
}

impl Session {
    /// Allocate a fresh session.
    #[must_use]
    pub fn open(allocator: Arc<dyn BufferAllocator>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                inbuf: BytesMut::with_capacity(INBUF_CAPACITY),
                evq: EventQueue::new(),
                readiness: Readiness::default(),
                closing: false,
                next_out_frame_id: 1,
                active_display_id: 0,
                active_display_handle: 0,
                next_display_handle: 1,
                map_surface_id: 0,
                surfaces: SurfaceTable::new(),
                stats: Counters::default(),
            }),
            cv: Condvar::new(),
            allocator,
        })
    }

    /// Take the session lock, riding through poisoning: the state is
    /// byte-oriented and stays coherent even if a holder panicked.
    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ingest client bytes; the device write entry point.
    ///
    /// Consumes all of `buf` or none of it. Oversized writes are refused at
    /// this boundary; an accumulator overflow discards the input, resets
    /// the accumulator, and answers with one `OVERFLOW` error reply while
    /// still reporting the bytes consumed.
    ///
    /// # Errors
    ///
    /// [`DeviceError::TooBig`] for writes beyond the frame limit,
    /// [`DeviceError::Closed`] once the session is closing.
    pub fn write(&self, buf: &[u8]) -> Result<usize, DeviceError> {
        if buf.is_empty() {
            return Ok(0);
        }
        if buf.len() > drawframe_proto::MAX_FRAME_BYTES as usize {
            return Err(DeviceError::TooBig);
        }

        {
            let mut st = self.lock();
            if st.closing {
                return Err(DeviceError::Closed);
            }
            st.stats.bytes_in += buf.len() as u64;

            if st.inbuf.len() + buf.len() > drawframe_proto::MAX_FRAME_BYTES as usize {
                st.inbuf.clear();
                drop(st);
                tracing::warn!(len = buf.len(), "accumulator overflow, input discarded");
                self.reply_error(0, ErrCode::Overflow, 0);
                return Ok(buf.len());
            }
            st.inbuf.extend_from_slice(buf);
        }

        self.pump();
        Ok(buf.len())
    }

    /// Extract, validate, and dispatch every complete frame accumulated.
    fn pump(&self) {
        loop {
            let frame_buf = {
                let mut st = self.lock();
                if st.closing {
                    return;
                }
                match frame::peek(&st.inbuf) {
                    Peek::NeedMore => return,
                    Peek::Bad(v) => {
                        st.stats.frames_received += 1;
                        st.stats.frames_invalid += 1;
                        st.inbuf.clear();
                        drop(st);
                        tracing::warn!(
                            code = ?v.code,
                            offset = v.offset,
                            "unrecoverable frame header, accumulator reset"
                        );
                        self.reply_error(0, v.code, v.offset);
                        return;
                    }
                    Peek::Frame { len } => {
                        st.stats.frames_received += 1;
                        st.inbuf.split_to(len).freeze()
                    }
                }
            };

            match frame::validate(&frame_buf) {
                Err(v) => {
                    self.lock().stats.frames_invalid += 1;
                    self.reply_error(0, v.code, v.offset);
                }
                Ok(valid) => {
                    self.process_frame(&valid);
                    self.lock().stats.frames_processed += 1;
                }
            }
        }
    }

    /// Take the next queued outbound frame; the device read entry point.
    ///
    /// # Errors
    ///
    /// [`DeviceError::WouldBlock`] when `blocking` is false and the queue
    /// is empty; [`DeviceError::Closed`] once the session is closing,
    /// including for waiters woken by close.
    pub fn next_event(&self, blocking: bool) -> Result<Bytes, DeviceError> {
        let mut st = self.lock();
        loop {
            if st.closing {
                return Err(DeviceError::Closed);
            }
            if let Some(frame) = st.evq.pop() {
                return Ok(frame);
            }
            if !blocking {
                return Err(DeviceError::WouldBlock);
            }
            st = self.cv.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Readiness query for "readable".
    ///
    /// Registers `watcher` (when given) only in the not-ready case, to be
    /// consumed by the next enqueue or close broadcast.
    pub fn poll_readable(&self, watcher: Option<&Arc<dyn ReadyWaker>>) -> PollState {
        let mut st = self.lock();
        if st.closing {
            return PollState::HangUp;
        }
        if !st.evq.is_empty() {
            return PollState::Readable;
        }
        if let Some(watcher) = watcher {
            st.readiness.register(watcher);
        }
        PollState::NotReady
    }

    /// Select-map control op: pick the surface a later [`Session::map`]
    /// call will target.
    ///
    /// A failed lookup leaves any previous selection in place.
    pub fn select_map_surface(&self, surface_id: u32) -> MapSurface {
        let mut rec =
            MapSurface { status: ErrCode::Ok.status(), surface_id, stride_bytes: 0, bytes_total: 0 };
        if surface_id == 0 {
            rec.status = ErrCode::InvalidArg.status();
            return rec;
        }

        let mut st = self.lock();
        let Some((stride, total)) =
            st.surfaces.get(surface_id).map(|sf| (sf.stride_bytes, sf.bytes_total))
        else {
            rec.status = ErrCode::NotFound.status();
            return rec;
        };
        st.map_surface_id = surface_id;
        rec.stride_bytes = stride;
        rec.bytes_total = total;
        rec
    }

    /// Map the selected surface's backing store; the mapping primitive.
    ///
    /// Allocates the buffer object lazily, outside the session lock, sized
    /// to the surface's total bytes and zero-initialised. The returned
    /// [`Mapping`] holds its own reference; dropping it is the unmap.
    ///
    /// # Errors
    ///
    /// [`DeviceError::InvalidArg`] for a nonzero offset, zero size, or size
    /// beyond the surface total; [`DeviceError::NotFound`] when nothing is
    /// selected or the selection no longer names a live surface;
    /// [`DeviceError::NoMemory`] when allocation fails.
    pub fn map(&self, offset: u64, size: usize) -> Result<Mapping, DeviceError> {
        if offset != 0 || size == 0 {
            return Err(DeviceError::InvalidArg);
        }

        let total = {
            let st = self.lock();
            let id = st.map_surface_id;
            if id == 0 {
                return Err(DeviceError::NotFound);
            }
            let Some(surface) = st.surfaces.get(id) else {
                return Err(DeviceError::NotFound);
            };
            if size > surface.bytes_total as usize {
                return Err(DeviceError::InvalidArg);
            }
            if let Some(buffer) = &surface.buffer {
                return Ok(Mapping::new(Arc::clone(buffer), size));
            }
            surface.bytes_total as usize
        };

        // Allocation runs without the lock; it may wait for memory but
        // never on protocol state.
        let fresh = self.allocator.allocate(total).map_err(|_| DeviceError::NoMemory)?;

        let mut st = self.lock();
        let id = st.map_surface_id;
        if id == 0 {
            return Err(DeviceError::NotFound);
        }
        let Some(surface) = st.surfaces.get_mut(id) else {
            return Err(DeviceError::NotFound);
        };
        if size > surface.bytes_total as usize {
            return Err(DeviceError::InvalidArg);
        }
        // A racing map may have installed a buffer meanwhile; keep the
        // winner and drop the spare.
        let buffer = Arc::clone(surface.buffer.get_or_insert(fresh));
        Ok(Mapping::new(buffer, size))
    }

    /// Stats control op: counters plus live accumulator/queue gauges.
    pub fn stats(&self) -> StatsSnapshot {
        let st = self.lock();
        st.stats.snapshot(st.evq.depth() as u32, st.inbuf.len() as u32)
    }

    /// True once the session has entered the closing state.
    pub fn is_closed(&self) -> bool {
        self.lock().closing
    }

    /// Enter the closing state and release session-owned resources.
    ///
    /// Idempotent. Wakes parked readers (they return the closed error) and
    /// pollers, drains the event queue, releases the accumulator, and drops
    /// surface records — each record's buffer object persists while
    /// mappings hold references. No event is enqueued afterwards.
    pub fn shutdown(&self) {
        let mut st = self.lock();
        if st.closing {
            return;
        }
        st.closing = true;

        self.cv.notify_all();
        st.readiness.broadcast();

        st.evq.clear();
        st.inbuf = BytesMut::new();
        st.surfaces.clear();

        tracing::debug!("session closed");
    }

    /// Enqueue a finished outbound frame, assigning its `frame_id`.
    ///
    /// Queue order equals id order: the id counter only advances under the
    /// same lock hold that pushes the frame.
    pub(crate) fn enqueue_frame(&self, mut frame: BytesMut) {
        if frame.len() > drawframe_proto::MAX_EVENT_BYTES as usize {
            tracing::warn!(len = frame.len(), "event too large, not enqueued");
            return;
        }

        let mut st = self.lock();
        if st.closing {
            st.stats.events_dropped += 1;
            return;
        }

        let frame_id = st.next_out_frame_id;
        st.next_out_frame_id = st.next_out_frame_id.wrapping_add(1);
        frame::set_frame_id(&mut frame, frame_id);

        let len = frame.len();
        st.evq.push(frame.freeze());
        st.stats.events_enqueued += 1;
        st.stats.bytes_out += len as u64;
        if st.evq.bytes_total() > drawframe_proto::MAX_EVQ_BYTES as usize {
            // Soft cap: advisory only, surfaced through stats
            tracing::debug!(evq_bytes = st.evq.bytes_total(), "event queue above soft cap");
        }

        self.cv.notify_one();
        st.readiness.broadcast();
    }

    /// Build and enqueue a single-message reply frame.
    pub(crate) fn reply<P: Wire>(&self, msg_type: MsgType, msg_id: u32, payload: &P) {
        let mut builder = frame::FrameBuilder::new();
        builder.message(msg_type, msg_id, payload);
        self.enqueue_frame(builder.finish());
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("closed", &self.is_closed()).finish()
    }
}
