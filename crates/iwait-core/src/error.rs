use std::time::Duration;

use thiserror::Error;

use crate::result::WaitResult;

/// Rejection of a resource identifier before any probing starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid resource prefix `{prefix}` in `{resource}`")]
    UnknownPrefix { resource: String, prefix: String },

    #[error("resource `{resource}` has an empty value")]
    EmptyValue { resource: String },

    #[error("invalid TCP resource `{value}`; expected [host:]port")]
    TcpFormat { value: String },

    #[error("invalid port `{port}`; port must be between 1 and 65535")]
    Port { port: String },

    #[error("invalid URL `{url}`: {reason}")]
    Url { url: String, reason: String },

    #[error("invalid ping host `{host}`")]
    PingHost { host: String },
}

/// Informational failure of a single probe. Never aborts the wait.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("{path}: {reason}")]
    Io { path: String, reason: String },

    #[error("http request failed: {reason}")]
    Http { reason: String },

    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("{what} is not supported on this platform")]
    Unsupported { what: String },
}

/// Terminal failure of a wait operation.
#[derive(Debug, Error)]
pub enum WaitError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid options: {reason}")]
    Config { reason: String },

    #[error("timed out after {}ms waiting for: {}", timeout.as_millis(), pending.join(", "))]
    Timeout {
        timeout: Duration,
        pending: Vec<String>,
        result: WaitResult,
    },

    #[error("operation aborted after {}ms", elapsed.as_millis())]
    Aborted { elapsed: Duration },
}

impl WaitError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

pub type WaitOutcome = Result<WaitResult, WaitError>;
