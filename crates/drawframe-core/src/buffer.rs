//! Pixel backing-store objects and the mapping handle.
//!
//! The host's swap-backed anonymous memory allocator is out of scope;
//! [`BufferAllocator`] is the factory seam and [`HeapAllocator`] the
//! default, zero-filled heap implementation. A [`PixelBuffer`] is counted
//! two ways: the `Arc` keeps the storage alive (one reference held by the
//! surface record, one per live [`Mapping`]), and `map_refs` tracks the
//! number of outstanding mappings for bookkeeping. Destroying a surface
//! drops the session's reference; the buffer persists until the last
//! mapping drops.
//!
//! The server never touches pixel content — clients write through their
//! mappings, and there is no server-side synchronisation of pixel bytes
//! beyond the `RwLock` keeping the accesses defined.

use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicU32, Ordering},
};

use thiserror::Error;

/// Backing-store allocation failure.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("backing-store allocation of {len} bytes failed")]
pub struct AllocError {
    /// Requested length in bytes.
    pub len: usize,
}

/// Factory for pixel backing stores.
///
/// Implementations must return a zero-initialised buffer of exactly `len`
/// bytes. Called without the session lock held; may block on memory
/// pressure but never on protocol state.
pub trait BufferAllocator: Send + Sync {
    /// Allocate a zero-initialised buffer of `len` bytes.
    fn allocate(&self, len: usize) -> Result<Arc<PixelBuffer>, AllocError>;
}

/// Default allocator: zero-filled heap storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl BufferAllocator for HeapAllocator {
    fn allocate(&self, len: usize) -> Result<Arc<PixelBuffer>, AllocError> {
        Ok(Arc::new(PixelBuffer::zeroed(len)))
    }
}

/// A refcounted pixel backing store.
///
/// Lifetime is governed by the `Arc` alone; the surface record and every
/// mapping each hold one reference. Content starts zeroed.
pub struct PixelBuffer {
    len: usize,
    bytes: RwLock<Box<[u8]>>,
    map_refs: AtomicU32,
}

impl PixelBuffer {
    /// A zero-initialised buffer of `len` bytes.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self {
            len,
            bytes: RwLock::new(vec![0u8; len].into_boxed_slice()),
            map_refs: AtomicU32::new(0),
        }
    }

    /// Buffer length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length buffer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of outstanding mappings.
    #[must_use]
    pub fn map_refs(&self) -> u32 {
        self.map_refs.load(Ordering::Acquire)
    }

    fn copy_out(&self, offset: usize, dst: &mut [u8]) -> bool {
        let guard = self.bytes.read().unwrap_or_else(PoisonError::into_inner);
        let Some(src) = guard.get(offset..offset + dst.len()) else {
            return false;
        };
        dst.copy_from_slice(src);
        true
    }

    fn copy_in(&self, offset: usize, src: &[u8]) -> bool {
        let mut guard = self.bytes.write().unwrap_or_else(PoisonError::into_inner);
        let Some(dst) = guard.get_mut(offset..offset + src.len()) else {
            return false;
        };
        dst.copy_from_slice(src);
        true
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("len", &self.len)
            .field("map_refs", &self.map_refs())
            .finish()
    }
}

/// A live client mapping of a surface's backing store.
///
/// Holds one `Arc` reference plus one `map_refs` count, both released on
/// drop (the host's unmap path). Accesses are bounded by the mapped size,
/// which may be smaller than the buffer.
#[derive(Debug)]
pub struct Mapping {
    buffer: Arc<PixelBuffer>,
    len: usize,
}

impl Mapping {
    pub(crate) fn new(buffer: Arc<PixelBuffer>, len: usize) -> Self {
        buffer.map_refs.fetch_add(1, Ordering::AcqRel);
        Self { buffer, len }
    }

    /// Mapped length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length mapping (never produced by `map`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read `dst.len()` bytes starting at `offset` within the mapping.
    ///
    /// `false` if the range falls outside the mapped size.
    #[must_use]
    pub fn read_at(&self, offset: usize, dst: &mut [u8]) -> bool {
        if offset.checked_add(dst.len()).is_none_or(|end| end > self.len) {
            return false;
        }
        self.buffer.copy_out(offset, dst)
    }

    /// Write `src` starting at `offset` within the mapping.
    ///
    /// `false` if the range falls outside the mapped size.
    #[must_use]
    pub fn write_at(&self, offset: usize, src: &[u8]) -> bool {
        if offset.checked_add(src.len()).is_none_or(|end| end > self.len) {
            return false;
        }
        self.buffer.copy_in(offset, src)
    }

    /// The underlying backing store.
    #[must_use]
    pub fn buffer(&self) -> &Arc<PixelBuffer> {
        &self.buffer
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        self.buffer.map_refs.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_zero_initialised() {
        let buf = HeapAllocator.allocate(32).unwrap();
        let mapping = Mapping::new(buf, 32);
        let mut out = [0xFFu8; 32];
        assert!(mapping.read_at(0, &mut out));
        assert_eq!(out, [0u8; 32]);
    }

    #[test]
    fn mappings_share_content() {
        let buf = HeapAllocator.allocate(16).unwrap();
        let a = Mapping::new(Arc::clone(&buf), 16);
        let b = Mapping::new(buf, 16);

        assert!(a.write_at(4, &[1, 2, 3, 4]));
        let mut out = [0u8; 4];
        assert!(b.read_at(4, &mut out));
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn map_refs_track_outstanding_mappings() {
        let buf = HeapAllocator.allocate(8).unwrap();
        assert_eq!(buf.map_refs(), 0);

        let a = Mapping::new(Arc::clone(&buf), 8);
        let b = Mapping::new(Arc::clone(&buf), 8);
        assert_eq!(buf.map_refs(), 2);

        drop(a);
        assert_eq!(buf.map_refs(), 1);
        drop(b);
        assert_eq!(buf.map_refs(), 0);
    }

    #[test]
    fn accesses_are_bounded_by_the_mapped_size() {
        let buf = HeapAllocator.allocate(32).unwrap();
        let short = Mapping::new(buf, 16);
        assert!(!short.read_at(8, &mut [0u8; 16]));
        assert!(!short.write_at(16, &[0]));
        assert!(short.write_at(15, &[0]));
    }

    #[test]
    fn buffer_outlives_the_surface_reference() {
        let session_ref = HeapAllocator.allocate(8).unwrap();
        let mapping = Mapping::new(Arc::clone(&session_ref), 8);
        drop(session_ref); // surface destroyed
        assert!(mapping.write_at(0, &[42]));
        let mut out = [0u8; 1];
        assert!(mapping.read_at(0, &mut out));
        assert_eq!(out, [42]);
    }
}
