//! Process-wide device registry.
//!
//! The module-lifecycle analog: [`install`] creates the device (module
//! load / `make_dev`), [`uninstall`] destroys it (module unload), and
//! [`open`] opens a session on the installed device. Library users who
//! don't need a global device can hold a [`DrawDevice`] directly; the
//! Unix-socket binary goes through this registry so startup and shutdown
//! mirror the device-node lifecycle.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    device::{DeviceHandle, DrawDevice},
    error::ServerError,
};

static DEVICE: Mutex<Option<Arc<DrawDevice>>> = Mutex::new(None);

fn slot() -> std::sync::MutexGuard<'static, Option<Arc<DrawDevice>>> {
    DEVICE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install `device` as the process-wide draw device.
///
/// Returns the shared device so the caller can also serve it directly.
///
/// # Errors
///
/// [`ServerError::AlreadyInstalled`] if a device is already registered.
pub fn install(device: DrawDevice) -> Result<Arc<DrawDevice>, ServerError> {
    let mut slot = slot();
    if slot.is_some() {
        return Err(ServerError::AlreadyInstalled);
    }
    let device = Arc::new(device);
    *slot = Some(Arc::clone(&device));
    tracing::info!("draw device installed");
    Ok(device)
}

/// Remove the process-wide device. Existing sessions keep running until
/// their handles drop.
///
/// Returns whether a device was installed.
pub fn uninstall() -> bool {
    let removed = slot().take().is_some();
    if removed {
        tracing::info!("draw device uninstalled");
    }
    removed
}

/// Whether a device is currently installed.
#[must_use]
pub fn is_installed() -> bool {
    slot().is_some()
}

/// Open a session on the installed device.
///
/// # Errors
///
/// [`ServerError::NotInstalled`] when no device is registered.
pub fn open() -> Result<DeviceHandle, ServerError> {
    let device = slot().clone().ok_or(ServerError::NotInstalled)?;
    Ok(device.open())
}
