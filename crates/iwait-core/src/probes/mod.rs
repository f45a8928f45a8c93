//! Readiness probes, one per resource kind.
//!
//! A probe answers "is this resource ready right now?". Expected absence
//! (missing file, refused connection, rejected status) is `Ok(false)` so that
//! reverse mode can wait for it; anything else is a [`ProbeError`] that the
//! scheduler records against the resource and treats as not ready.

use async_trait::async_trait;

use crate::config::WaitConfig;
use crate::error::{ProbeError, WaitError};
use crate::resource::{ResourceDescriptor, ResourceTarget};

pub use dir::DirProbe;
pub use file::FileProbe;
pub use http::HttpProbe;
pub use ping::PingProbe;
pub use socket::SocketProbe;
pub use tcp::TcpProbe;

mod dir;
mod file;
mod http;
mod ping;
mod socket;
mod tcp;

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, resource: &ResourceDescriptor) -> Result<bool, ProbeError>;
}

/// The built-in probes, configured once per wait operation.
pub struct ProbeRegistry {
    file: FileProbe,
    http: HttpProbe,
    tcp: TcpProbe,
    socket: SocketProbe,
    ping: PingProbe,
    dir: DirProbe,
}

impl ProbeRegistry {
    pub fn new(config: &WaitConfig) -> Result<Self, WaitError> {
        Ok(Self {
            file: FileProbe::new(config.window),
            http: HttpProbe::new(config)?,
            tcp: TcpProbe::new(config.tcp_timeout),
            socket: SocketProbe,
            ping: PingProbe,
            dir: DirProbe::new(config.dir_not_empty),
        })
    }
}

#[async_trait]
impl Prober for ProbeRegistry {
    async fn probe(&self, resource: &ResourceDescriptor) -> Result<bool, ProbeError> {
        match &resource.target {
            ResourceTarget::File(pattern) => self.file.check(pattern).await,
            ResourceTarget::Http { method, endpoint } => self.http.check(*method, endpoint).await,
            ResourceTarget::Tcp { host, port } => self.tcp.check(host, *port).await,
            ResourceTarget::Socket(path) => self.socket.check(path).await,
            ResourceTarget::Ping(host) => self.ping.check(host).await,
            ResourceTarget::Dir(path) => self.dir.check(path).await,
        }
    }
}

fn io_error(path: &std::path::Path, err: &std::io::Error) -> ProbeError {
    ProbeError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
