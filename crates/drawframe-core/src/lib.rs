//! Per-session protocol engine for the draw device.
//!
//! One [`Session`] exists per open of the device node. It owns everything a
//! client interaction touches: the inbound reassembly accumulator, the
//! outbound event queue, the surface table, the display binding, the
//! map-selection id, and the stats counters — all behind a single coarse
//! lock, with a condition variable as the read-side wait channel and a
//! readiness record for pollers.
//!
//! Data flow: `write` appends client bytes to the accumulator and pumps the
//! extractor; complete frames are validated and dispatched with the lock
//! released; handlers enqueue reply frames; `next_event` hands queued
//! frames to the reader, blocking or not. Mapping is an orthogonal channel:
//! a control call selects a surface, a later `map` call hands out the
//! surface's refcounted, zero-initialised backing store.
//!
//! This crate performs no I/O; `drawframe-server` binds it to the host's
//! device-op contract.

pub mod buffer;
mod dispatch;
mod error;
mod eventq;
mod readiness;
mod session;
mod stats;
mod surface;

pub use buffer::{AllocError, BufferAllocator, HeapAllocator, Mapping, PixelBuffer};
pub use error::DeviceError;
pub use readiness::{PollState, ReadyWaker};
pub use session::Session;
pub use stats::StatsSnapshot;
pub use surface::{MAX_SESSION_BYTES, MAX_SURFACE_BYTES, MAX_SURFACES, MapSurface};
