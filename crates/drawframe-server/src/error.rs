//! Server error types.

use std::fmt;

use drawframe_core::DeviceError;

/// Errors that can occur in the server layer.
///
/// Per-session host-API errors stay typed as [`DeviceError`]; this enum
/// covers the surrounding machinery — configuration, transport, and the
/// device registry lifecycle.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error (bad socket path, etc.).
    ///
    /// Fatal at startup; fix configuration and restart.
    Config(String),

    /// Transport/network error (bind failure, I/O error, etc.).
    ///
    /// May be transient (a broken connection) or fatal (socket path in
    /// use). Check the message for details.
    Transport(String),

    /// A device is already installed.
    AlreadyInstalled,

    /// No device is installed; `install` must run first.
    NotInstalled,

    /// Per-session device error surfaced through a server path.
    Device(DeviceError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::AlreadyInstalled => write!(f, "device already installed"),
            Self::NotInstalled => write!(f, "no device installed"),
            Self::Device(err) => write!(f, "device error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Device(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DeviceError> for ServerError {
    fn from(err: DeviceError) -> Self {
        Self::Device(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
