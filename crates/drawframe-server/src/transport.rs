//! Unix-socket front end.
//!
//! Stands in for the character-device node: every accepted connection
//! opens one session on the device. Socket reads feed the session's write
//! entry point; a blocking-pool task pumps `read_frame` results through a
//! channel to the socket writer, so frame delivery keeps the engine's
//! blocking-read semantics without stalling the runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use drawframe_core::DeviceError;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
    sync::mpsc,
};

use crate::{
    device::{DeviceHandle, DrawDevice},
    error::ServerError,
};

/// Socket-read buffer size. One read never exceeds a frame, so this also
/// bounds per-call ingest well below the device's write limit.
const READ_BUF_BYTES: usize = 64 * 1024;

/// Listening front end serving sessions of one [`DrawDevice`].
pub struct DrawListener {
    listener: UnixListener,
    path: PathBuf,
    device: Arc<DrawDevice>,
}

impl DrawListener {
    /// Bind the listening socket at `path`.
    ///
    /// # Errors
    ///
    /// [`ServerError::Transport`] when the bind fails (path in use,
    /// missing directory, permissions).
    pub fn bind(path: impl AsRef<Path>, device: Arc<DrawDevice>) -> Result<Self, ServerError> {
        let path = path.as_ref().to_path_buf();
        let listener = UnixListener::bind(&path)?;
        Ok(Self { listener, path, device })
    }

    /// Path the listener is bound to.
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.path
    }

    /// Accept connections and serve each as one session, until an accept
    /// error that is not per-connection.
    ///
    /// # Errors
    ///
    /// [`ServerError::Transport`] when accepting fails fatally.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            let (stream, _addr) = self.listener.accept().await?;
            let handle = self.device.open();
            tokio::spawn(async move {
                serve_session(stream, handle).await;
            });
        }
    }
}

impl std::fmt::Debug for DrawListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawListener").field("path", &self.path).finish_non_exhaustive()
    }
}

/// Serve one connection as one session until either side goes away.
async fn serve_session(stream: UnixStream, handle: DeviceHandle) {
    tracing::debug!("connection accepted");
    let handle = Arc::new(handle);
    let (mut socket_rd, mut socket_wr) = stream.into_split();
    let (tx, mut rx) = mpsc::channel::<Bytes>(16);

    // Outbound pump: blocking reads on the session, forwarded to the
    // socket writer task through the channel.
    let pump = {
        let handle = Arc::clone(&handle);
        tokio::task::spawn_blocking(move || {
            loop {
                match handle.read_frame() {
                    Ok(frame) => {
                        if tx.blocking_send(frame).is_err() {
                            return;
                        }
                    }
                    Err(DeviceError::Closed) => return,
                    Err(err) => {
                        tracing::debug!(%err, "outbound pump stopped");
                        return;
                    }
                }
            }
        })
    };

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            eprintln!("PROBE: writer got frame len={}", frame.len());
            if let Err(err) = socket_wr.write_all(&frame).await {
                eprintln!("PROBE: writer write_all failed: {err}");
                tracing::debug!(%err, "socket write failed");
                return;
            }
            eprintln!("PROBE: writer write_all done");
        }
        eprintln!("PROBE: writer loop exited");
    });

    let mut buf = vec![0u8; READ_BUF_BYTES];
    loop {
        eprintln!("PROBE: socket_rd.read awaiting");
        match socket_rd.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                eprintln!("PROBE: read {n} bytes");
                if let Err(err) = handle.write(&buf[..n]) {
                    tracing::debug!(%err, "session write failed");
                    break;
                }
            }
            Err(err) => {
                tracing::debug!(%err, "socket read failed");
                break;
            }
        }
    }

    // Close the session; the pump wakes with Closed, the channel drops,
    // and the writer drains out.
    handle.shutdown();
    let _ = pump.await;
    let _ = writer.await;
    tracing::debug!("connection closed");
}
