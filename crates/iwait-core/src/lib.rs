//! Readiness waiting for iwait.
//!
//! This crate parses resource identifiers (`file:`, `http:`, `tcp:`, ...),
//! probes them on a fixed cadence, and completes once the configured
//! strategy is satisfied, the timeout expires, or the caller cancels.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod probes;
pub mod resource;
pub mod result;
pub mod scheduler;
pub mod strategy;

pub use config::{BasicAuth, StatusValidator, WaitConfig, WaitOptions};
pub use error::{ParseError, ProbeError, WaitError, WaitOutcome};
pub use probes::{ProbeRegistry, Prober};
pub use resource::{
    HttpEndpoint, HttpMethod, ResourceDescriptor, ResourceKind, ResourceTarget, parse_resource,
    parse_resources,
};
pub use result::{ResourceState, WaitResult};
pub use scheduler::{wait, wait_with};
pub use strategy::Strategy;

pub use tokio_util::sync::CancellationToken;
