//! Device-op surface for the draw protocol engine.
//!
//! Binds [`drawframe_core`]'s per-session engine to a host-I/O shape:
//!
//! - [`DrawDevice`]: the device object; every `open` is an independent
//!   session.
//! - [`DeviceHandle`]: one open of the device — read/write/poll, the
//!   control operations (stats, select-map), and the mapping primitive,
//!   with a per-handle non-blocking flag. Dropping the handle closes the
//!   session.
//! - [`registry`]: process-wide install/uninstall hooks, the
//!   module-lifecycle analog of creating and destroying the device node.
//! - [`DrawListener`]: a Unix-socket front end that serves each accepted
//!   connection as one session, standing in for the character-device node.

mod device;
mod error;
pub mod registry;
mod transport;

pub use device::{DeviceHandle, DrawDevice, PollEvents};
pub use error::ServerError;
pub use transport::DrawListener;

/// Device name.
pub const DEVNAME: &str = "draw";

/// Path of the device node this server stands in for.
pub const NODE_PATH: &str = "/dev/draw";
