use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::ProbeError;

pub struct TcpProbe {
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Ready when a connection to `host:port` is accepted within the timeout.
    pub async fn check(&self, host: &str, port: u16) -> Result<bool, ProbeError> {
        match timeout(self.connect_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => {
                tracing::trace!(host, port, "tcp connection accepted");
                Ok(true)
            }
            Ok(Err(err)) => {
                tracing::trace!(host, port, error = %err, "tcp connection failed");
                Ok(false)
            }
            Err(_) => {
                tracing::trace!(host, port, timeout_ms = self.connect_timeout.as_millis() as u64, "tcp connection timed out");
                Ok(false)
            }
        }
    }
}
