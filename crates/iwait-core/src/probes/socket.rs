use std::path::Path;

use crate::error::ProbeError;

/// Connects to a Unix domain socket.
pub struct SocketProbe;

impl SocketProbe {
    #[cfg(unix)]
    pub async fn check(&self, path: &Path) -> Result<bool, ProbeError> {
        match tokio::net::UnixStream::connect(path).await {
            Ok(_stream) => Ok(true),
            Err(err) => {
                tracing::trace!(socket = %path.display(), error = %err, "socket connection failed");
                Ok(false)
            }
        }
    }

    #[cfg(not(unix))]
    pub async fn check(&self, _path: &Path) -> Result<bool, ProbeError> {
        Err(ProbeError::Unsupported {
            what: "unix domain sockets".into(),
        })
    }
}
