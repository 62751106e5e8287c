//! Session-scoped surface records and their caps.
//!
//! Surfaces are semantic objects: geometry plus a lazily allocated backing
//! store. Ids are unique and strictly increasing within a session, starting
//! at 1; id 0 is reserved and never names a surface.

use std::sync::Arc;

use drawframe_proto::payloads::PixelFormat;

use crate::buffer::PixelBuffer;

/// Maximum live surfaces per session.
pub const MAX_SURFACES: usize = 64;

/// Maximum backing-store size of a single surface (64 MiB).
pub const MAX_SURFACE_BYTES: u32 = 64 * 1024 * 1024;

/// Maximum summed backing-store size of a session's live surfaces (256 MiB).
pub const MAX_SESSION_BYTES: u64 = 256 * 1024 * 1024;

/// Select-map control record.
///
/// The caller sets `surface_id`; the session fills the rest. On success the
/// session records the id as its map selection for a later `map` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSurface {
    /// 0 on success, else a `drawframe_proto::ErrCode` value.
    pub status: u32,
    /// Surface the caller wants to map.
    pub surface_id: u32,
    /// Row stride of the selected surface; 0 on failure.
    pub stride_bytes: u32,
    /// Backing-store size of the selected surface; 0 on failure.
    pub bytes_total: u32,
}

/// One live surface record.
#[derive(Debug)]
pub(crate) struct Surface {
    pub(crate) id: u32,
    pub(crate) width_px: u32,
    pub(crate) height_px: u32,
    pub(crate) format: PixelFormat,
    pub(crate) stride_bytes: u32,
    pub(crate) bytes_total: u32,
    /// Backing store, allocated on first map. The record holds the
    /// session's reference; mappings hold their own.
    pub(crate) buffer: Option<Arc<PixelBuffer>>,
}

/// Geometry of a freshly created surface, for the reply payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CreatedSurface {
    pub(crate) id: u32,
    pub(crate) stride_bytes: u32,
    pub(crate) bytes_total: u32,
}

/// Why a structurally valid create request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SurfaceLimit {
    /// The surface alone would exceed the per-surface byte cap.
    Oversized,
    /// The session is at its surface count or summed byte cap.
    CapExceeded,
}

/// Ordered collection of a session's surfaces.
#[derive(Debug)]
pub(crate) struct SurfaceTable {
    surfaces: Vec<Surface>,
    next_id: u32,
    bytes_live: u64,
}

impl SurfaceTable {
    pub(crate) fn new() -> Self {
        Self { surfaces: Vec::new(), next_id: 1, bytes_live: 0 }
    }

    /// Allocate a record for validated geometry.
    ///
    /// Dimensions are nonzero and the format is supported by the time this
    /// runs; only the caps are checked here. The id is consumed on success
    /// only, keeping ids dense as well as strictly increasing.
    pub(crate) fn create(
        &mut self,
        width_px: u32,
        height_px: u32,
        format: PixelFormat,
    ) -> Result<CreatedSurface, SurfaceLimit> {
        let stride = u64::from(width_px) * u64::from(PixelFormat::BYTES_PER_PIXEL);
        let total = stride * u64::from(height_px);
        if total > u64::from(MAX_SURFACE_BYTES) {
            return Err(SurfaceLimit::Oversized);
        }

        if self.surfaces.len() >= MAX_SURFACES || self.bytes_live + total > MAX_SESSION_BYTES {
            return Err(SurfaceLimit::CapExceeded);
        }

        let created = CreatedSurface {
            id: self.next_id,
            stride_bytes: stride as u32,
            bytes_total: total as u32,
        };
        self.next_id += 1;
        self.bytes_live += total;
        self.surfaces.push(Surface {
            id: created.id,
            width_px,
            height_px,
            format,
            stride_bytes: created.stride_bytes,
            bytes_total: created.bytes_total,
            buffer: None,
        });

        Ok(created)
    }

    pub(crate) fn get(&self, id: u32) -> Option<&Surface> {
        self.surfaces.iter().find(|sf| sf.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: u32) -> Option<&mut Surface> {
        self.surfaces.iter_mut().find(|sf| sf.id == id)
    }

    /// Remove and return the record with `id`.
    pub(crate) fn remove(&mut self, id: u32) -> Option<Surface> {
        let index = self.surfaces.iter().position(|sf| sf.id == id)?;
        let surface = self.surfaces.remove(index);
        self.bytes_live -= u64::from(surface.bytes_total);
        Some(surface)
    }

    /// Summed backing-store bytes of live surfaces.
    pub(crate) fn bytes_live(&self) -> u64 {
        self.bytes_live
    }

    /// Drop every record. Buffer objects persist while mappings hold them.
    pub(crate) fn clear(&mut self) {
        self.surfaces.clear();
        self.bytes_live = 0;
    }
}
