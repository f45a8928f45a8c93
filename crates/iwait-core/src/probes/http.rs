use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Url};

use crate::config::{BasicAuth, StatusValidator, WaitConfig};
use crate::error::{ProbeError, WaitError};
use crate::resource::{HttpEndpoint, HttpMethod};

const MAX_REDIRECTS: usize = 10;

/// HEAD/GET probe over TCP (reqwest) or a Unix socket (hyper).
pub struct HttpProbe {
    client: Client,
    headers: HeaderMap,
    validate_status: StatusValidator,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(config: &WaitConfig) -> Result<Self, WaitError> {
        let headers = build_headers(config)?;
        let redirect = if config.follow_redirect {
            Policy::limited(MAX_REDIRECTS)
        } else {
            Policy::none()
        };
        let client = Client::builder()
            .timeout(config.http_timeout)
            .redirect(redirect)
            .default_headers(headers.clone())
            .build()
            .map_err(|err| WaitError::config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            headers,
            validate_status: config.validate_status.clone(),
            timeout: config.http_timeout,
        })
    }

    pub async fn check(&self, method: HttpMethod, endpoint: &HttpEndpoint) -> Result<bool, ProbeError> {
        match endpoint {
            HttpEndpoint::Url(url) => self.check_url(method, url).await,
            HttpEndpoint::Unix {
                socket_path,
                request_path,
            } => self.check_unix(method, socket_path, request_path).await,
        }
    }

    async fn check_url(&self, method: HttpMethod, url: &Url) -> Result<bool, ProbeError> {
        let response = match self
            .client
            .request(method.as_reqwest(), url.clone())
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) if err.is_builder() => {
                return Err(ProbeError::Http {
                    reason: err.to_string(),
                });
            }
            Err(err) => {
                tracing::trace!(%url, error = %err, "http request did not complete");
                return Ok(false);
            }
        };
        let status = response.status().as_u16();
        tracing::trace!(%url, status, "http probe response");
        Ok(self.validate_status.accepts(status))
    }

    #[cfg(unix)]
    async fn check_unix(
        &self,
        method: HttpMethod,
        socket_path: &Path,
        request_path: &str,
    ) -> Result<bool, ProbeError> {
        match tokio::time::timeout(
            self.timeout,
            unix::status(socket_path, method, request_path, &self.headers),
        )
        .await
        {
            Ok(Ok(status)) => {
                tracing::trace!(socket = %socket_path.display(), request_path, status, "http probe response");
                Ok(self.validate_status.accepts(status))
            }
            Ok(Err(unix::UnixHttpError::Request(reason))) => Err(ProbeError::Http { reason }),
            Ok(Err(unix::UnixHttpError::Transport(reason))) => {
                tracing::trace!(socket = %socket_path.display(), error = %reason, "http request did not complete");
                Ok(false)
            }
            Err(_) => {
                tracing::trace!(socket = %socket_path.display(), "http request timed out");
                Ok(false)
            }
        }
    }

    #[cfg(not(unix))]
    async fn check_unix(
        &self,
        _method: HttpMethod,
        _socket_path: &Path,
        _request_path: &str,
    ) -> Result<bool, ProbeError> {
        Err(ProbeError::Unsupported {
            what: "http over unix sockets".into(),
        })
    }
}

fn build_headers(config: &WaitConfig) -> Result<HeaderMap, WaitError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| WaitError::config(format!("invalid header name `{name}`: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| WaitError::config(format!("invalid value for header `{name}`: {err}")))?;
        headers.insert(name, value);
    }
    if let Some(auth) = &config.basic_auth {
        headers.insert(AUTHORIZATION, basic_auth_value(auth)?);
    }
    Ok(headers)
}

fn basic_auth_value(auth: &BasicAuth) -> Result<HeaderValue, WaitError> {
    let encoded = STANDARD.encode(format!("{}:{}", auth.username, auth.password));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
        .map_err(|err| WaitError::config(format!("invalid basic auth credentials: {err}")))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(unix)]
mod unix {
    use std::path::Path;

    use bytes::Bytes;
    use http_body_util::Empty;
    use hyper::Request;
    use hyper::header::HOST;
    use hyper_util::rt::TokioIo;
    use reqwest::header::HeaderMap;
    use tokio::net::UnixStream;

    use crate::resource::HttpMethod;

    pub(super) enum UnixHttpError {
        /// The request could not be built; retrying will not help.
        Request(String),
        /// Connecting or exchanging the request failed.
        Transport(String),
    }

    pub(super) async fn status(
        socket_path: &Path,
        method: HttpMethod,
        request_path: &str,
        headers: &HeaderMap,
    ) -> Result<u16, UnixHttpError> {
        let mut builder = Request::builder()
            .method(method.as_reqwest())
            .uri(request_path)
            .header(HOST, "localhost");
        if let Some(target) = builder.headers_mut() {
            target.extend(headers.clone());
        }
        let request = builder
            .body(Empty::<Bytes>::new())
            .map_err(|err| UnixHttpError::Request(err.to_string()))?;

        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|err| UnixHttpError::Transport(err.to_string()))?;
        let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|err| UnixHttpError::Transport(err.to_string()))?;
        let driver = tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::trace!(error = %err, "unix http connection closed");
            }
        });

        let outcome = sender
            .send_request(request)
            .await
            .map(|response| response.status().as_u16())
            .map_err(|err| UnixHttpError::Transport(err.to_string()));
        driver.abort();
        outcome
    }
}
