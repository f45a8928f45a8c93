use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::error::ParseError;

const DEFAULT_TCP_HOST: &str = "localhost";
const UNIX_HTTP_PREFIX: &str = "http://unix:";

/// Kind of resource, named after the identifier prefix that selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    File,
    Http,
    Https,
    HttpGet,
    HttpsGet,
    Tcp,
    Socket,
    Ping,
    Dir,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 9] = [
        Self::File,
        Self::Http,
        Self::Https,
        Self::HttpGet,
        Self::HttpsGet,
        Self::Tcp,
        Self::Socket,
        Self::Ping,
        Self::Dir,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Http => "http",
            Self::Https => "https",
            Self::HttpGet => "http-get",
            Self::HttpsGet => "https-get",
            Self::Tcp => "tcp",
            Self::Socket => "socket",
            Self::Ping => "ping",
            Self::Dir => "dir",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for ResourceKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.prefix() == value)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Head,
    Get,
}

impl HttpMethod {
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Head => reqwest::Method::HEAD,
            Self::Get => reqwest::Method::GET,
        }
    }
}

/// Where an HTTP probe sends its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpEndpoint {
    Url(Url),
    Unix {
        socket_path: PathBuf,
        request_path: String,
    },
}

/// Typed probe input produced once per resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceTarget {
    File(String),
    Http {
        method: HttpMethod,
        endpoint: HttpEndpoint,
    },
    Tcp {
        host: String,
        port: u16,
    },
    Socket(PathBuf),
    Ping(String),
    Dir(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    /// Identifier with the type prefix removed.
    pub uri: String,
    /// Identifier exactly as requested; the stable key for this resource.
    pub original: String,
    pub target: ResourceTarget,
}

impl FromStr for ResourceDescriptor {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_resource(value)
    }
}

pub fn parse_resources<S: AsRef<str>>(resources: &[S]) -> Result<Vec<ResourceDescriptor>, ParseError> {
    resources
        .iter()
        .map(|resource| parse_resource(resource.as_ref()))
        .collect()
}

pub fn parse_resource(resource: &str) -> Result<ResourceDescriptor, ParseError> {
    let (kind, uri) = match split_prefix(resource) {
        Some((prefix, rest)) => {
            let kind = prefix
                .parse::<ResourceKind>()
                .map_err(|_| ParseError::UnknownPrefix {
                    resource: resource.to_string(),
                    prefix: prefix.to_string(),
                })?;
            (kind, rest)
        }
        None => (ResourceKind::File, resource),
    };
    if uri.is_empty() {
        return Err(ParseError::EmptyValue {
            resource: resource.to_string(),
        });
    }

    let target = match kind {
        ResourceKind::File => ResourceTarget::File(uri.to_string()),
        ResourceKind::Http | ResourceKind::HttpGet => http_target(kind, "http", uri)?,
        ResourceKind::Https | ResourceKind::HttpsGet => http_target(kind, "https", uri)?,
        ResourceKind::Tcp => {
            let (host, port) = parse_tcp_host_port(uri)?;
            ResourceTarget::Tcp { host, port }
        }
        ResourceKind::Socket => ResourceTarget::Socket(PathBuf::from(uri)),
        ResourceKind::Ping => {
            if uri.starts_with('-') || uri.chars().any(char::is_whitespace) {
                return Err(ParseError::PingHost {
                    host: uri.to_string(),
                });
            }
            ResourceTarget::Ping(uri.to_string())
        }
        ResourceKind::Dir => ResourceTarget::Dir(PathBuf::from(uri)),
    };

    Ok(ResourceDescriptor {
        kind,
        uri: uri.to_string(),
        original: resource.to_string(),
        target,
    })
}

/// Splits `type:rest` when the text before the first colon looks like a type
/// name. Single letters are left alone so `C:\data` stays a file path.
fn split_prefix(resource: &str) -> Option<(&str, &str)> {
    let (prefix, rest) = resource.split_once(':')?;
    let mut chars = prefix.chars();
    let first = chars.next()?;
    if prefix.len() < 2 || !first.is_ascii_alphabetic() {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return None;
    }
    Some((prefix, rest))
}

fn http_target(kind: ResourceKind, scheme: &str, uri: &str) -> Result<ResourceTarget, ParseError> {
    let method = match kind {
        ResourceKind::HttpGet | ResourceKind::HttpsGet => HttpMethod::Get,
        _ => HttpMethod::Head,
    };
    let full = format!("{scheme}:{uri}");
    if let Some((socket_path, request_path)) = parse_http_unix_url(&full) {
        return Ok(ResourceTarget::Http {
            method,
            endpoint: HttpEndpoint::Unix {
                socket_path,
                request_path,
            },
        });
    }
    let url = Url::parse(&full).map_err(|err| ParseError::Url {
        url: full.clone(),
        reason: err.to_string(),
    })?;
    Ok(ResourceTarget::Http {
        method,
        endpoint: HttpEndpoint::Url(url),
    })
}

/// Extracts `(socket path, request path)` from `http://unix:<socket>:<path>`.
pub fn parse_http_unix_url(url: &str) -> Option<(PathBuf, String)> {
    let rest = url.strip_prefix(UNIX_HTTP_PREFIX)?;
    let (socket, path) = rest.split_once(':')?;
    if socket.is_empty() || path.is_empty() {
        return None;
    }
    let request_path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    Some((PathBuf::from(socket), request_path))
}

/// Parses `[host:]port`, defaulting the host to `localhost`.
pub fn parse_tcp_host_port(value: &str) -> Result<(String, u16), ParseError> {
    let (host, port_raw) = match value.rsplit_once(':') {
        Some((host, port)) => (host, port),
        None => ("", value),
    };
    if host.contains(':') {
        return Err(ParseError::TcpFormat {
            value: value.to_string(),
        });
    }
    if port_raw.is_empty() || !port_raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::TcpFormat {
            value: value.to_string(),
        });
    }
    let port = port_raw
        .parse::<u32>()
        .ok()
        .filter(|port| (1..=u32::from(u16::MAX)).contains(port))
        .ok_or_else(|| ParseError::Port {
            port: port_raw.to_string(),
        })?;
    let host = if host.is_empty() {
        DEFAULT_TCP_HOST.to_string()
    } else {
        host.to_string()
    };
    Ok((host, port as u16))
}
