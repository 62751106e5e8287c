//! The device object and per-open handles.
//!
//! `DrawDevice::open` is the open entry point: it allocates a fresh
//! session. `DeviceHandle` carries the remaining device ops — read, write,
//! poll, the stats and select-map control operations, and the mapping
//! primitive — plus the per-handle non-blocking flag. The handle is the
//! open file description: dropping it runs the session destructor.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use bitflags::bitflags;
use bytes::Bytes;
use drawframe_core::{
    BufferAllocator, DeviceError, HeapAllocator, MapSurface, Mapping, PollState, ReadyWaker,
    Session, StatsSnapshot,
};

bitflags! {
    /// Poll-event bits for the readiness query.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PollEvents: u32 {
        /// A queued outbound frame can be read.
        const READABLE = 0x0001;
        /// The session is in an error state.
        const ERROR = 0x0008;
        /// The session is closing.
        const HANGUP = 0x0010;
    }
}

/// The draw device. Every open is an independent session.
#[derive(Clone)]
pub struct DrawDevice {
    allocator: Arc<dyn BufferAllocator>,
}

impl Default for DrawDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawDevice {
    /// A device backed by the default heap allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(Arc::new(HeapAllocator))
    }

    /// A device with a custom backing-store allocator.
    #[must_use]
    pub fn with_allocator(allocator: Arc<dyn BufferAllocator>) -> Self {
        Self { allocator }
    }

    /// Open the device: allocate a session and hand out its handle.
    #[must_use]
    pub fn open(&self) -> DeviceHandle {
        tracing::debug!("device opened");
        DeviceHandle {
            session: Session::open(Arc::clone(&self.allocator)),
            nonblocking: AtomicBool::new(false),
        }
    }
}

impl std::fmt::Debug for DrawDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawDevice").finish_non_exhaustive()
    }
}

/// One open of the draw device.
///
/// Not shareable between opens; clone the underlying device and open again
/// for an independent session. The last use closes the session: `Drop`
/// runs [`DeviceHandle::shutdown`].
#[derive(Debug)]
pub struct DeviceHandle {
    session: Arc<Session>,
    nonblocking: AtomicBool,
}

impl DeviceHandle {
    /// Set the per-handle non-blocking flag for reads.
    pub fn set_nonblocking(&self, nonblocking: bool) {
        self.nonblocking.store(nonblocking, Ordering::Release);
    }

    /// Current non-blocking flag.
    #[must_use]
    pub fn nonblocking(&self) -> bool {
        self.nonblocking.load(Ordering::Acquire)
    }

    /// Write framed request bytes into the session.
    ///
    /// # Errors
    ///
    /// [`DeviceError::TooBig`] beyond the frame limit,
    /// [`DeviceError::Closed`] after close.
    pub fn write(&self, buf: &[u8]) -> Result<usize, DeviceError> {
        self.session.write(buf)
    }

    /// Read the next outbound frame into `buf`.
    ///
    /// One whole frame per call; a short buffer receives a prefix and the
    /// rest of the frame is discarded, so callers should size `buf` at
    /// least `MAX_EVENT_BYTES`. Blocks when the queue is empty unless the
    /// non-blocking flag is set.
    ///
    /// # Errors
    ///
    /// [`DeviceError::WouldBlock`] on an empty queue in non-blocking mode,
    /// [`DeviceError::Closed`] after close.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        let frame = self.read_frame()?;
        let n = frame.len().min(buf.len());
        buf[..n].copy_from_slice(&frame[..n]);
        Ok(n)
    }

    /// Read the next outbound frame, whole.
    ///
    /// # Errors
    ///
    /// As [`DeviceHandle::read`].
    pub fn read_frame(&self) -> Result<Bytes, DeviceError> {
        self.session.next_event(!self.nonblocking())
    }

    /// Readiness query.
    ///
    /// Reports the subset of `events` that is ready. On a closing session
    /// the hang-up/error subset is reported, or `HANGUP` when neither was
    /// requested. When nothing is ready, `watcher` (if given) is
    /// registered for the next readiness broadcast.
    pub fn poll(&self, events: PollEvents, watcher: Option<&Arc<dyn ReadyWaker>>) -> PollEvents {
        let wants_read = events.contains(PollEvents::READABLE);
        match self.session.poll_readable(if wants_read { watcher } else { None }) {
            PollState::HangUp => {
                let bits = events & (PollEvents::ERROR | PollEvents::HANGUP);
                if bits.is_empty() { PollEvents::HANGUP } else { bits }
            }
            PollState::Readable => events & PollEvents::READABLE,
            PollState::NotReady => PollEvents::empty(),
        }
    }

    /// Stats control op: a snapshot of the session counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.session.stats()
    }

    /// Select-map control op: pick the surface for a later [`DeviceHandle::map`].
    pub fn select_map_surface(&self, surface_id: u32) -> MapSurface {
        self.session.select_map_surface(surface_id)
    }

    /// The mapping primitive: map the selected surface's backing store.
    ///
    /// # Errors
    ///
    /// As [`Session::map`].
    pub fn map(&self, offset: u64, size: usize) -> Result<Mapping, DeviceError> {
        self.session.map(offset, size)
    }

    /// Close the session explicitly. Idempotent; also runs on drop.
    pub fn shutdown(&self) {
        self.session.shutdown();
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        self.session.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_open_is_an_independent_session() {
        let device = DrawDevice::new();
        let a = device.open();
        let b = device.open();

        a.shutdown();
        assert_eq!(a.read_frame(), Err(DeviceError::Closed));
        // b is unaffected
        b.set_nonblocking(true);
        assert_eq!(b.read_frame(), Err(DeviceError::WouldBlock));
    }

    #[test]
    fn poll_subset_semantics() {
        let device = DrawDevice::new();
        let handle = device.open();

        assert_eq!(handle.poll(PollEvents::READABLE, None), PollEvents::empty());

        handle.shutdown();
        assert_eq!(handle.poll(PollEvents::READABLE, None), PollEvents::HANGUP);
        assert_eq!(
            handle.poll(PollEvents::READABLE | PollEvents::HANGUP, None),
            PollEvents::HANGUP
        );
        assert_eq!(handle.poll(PollEvents::ERROR, None), PollEvents::ERROR);
    }
}
