#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod report;
pub mod telemetry;

pub use iwait_core;
pub use iwait_core::{
    BasicAuth, CancellationToken, ProbeError, StatusValidator, Strategy, WaitError, WaitOptions,
    WaitOutcome, WaitResult, wait,
};
