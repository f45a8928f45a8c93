use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ProbeError;

/// Readiness of one requested resource, updated after every probe.
#[derive(Debug, Clone)]
pub struct ResourceState {
    pub resource: String,
    pub ready: bool,
    /// Failure from the latest probe only; cleared by the next success.
    pub error: Option<ProbeError>,
    pub last_checked: Option<Instant>,
}

impl ResourceState {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            ready: false,
            error: None,
            last_checked: None,
        }
    }

    /// Folds one probe outcome into the state. Errors always mean not ready;
    /// `reverse` only inverts successful verdicts.
    pub fn record(&mut self, outcome: Result<bool, ProbeError>, reverse: bool, at: Instant) {
        match outcome {
            Ok(verdict) => {
                self.ready = verdict != reverse;
                self.error = None;
            }
            Err(err) => {
                self.ready = false;
                self.error = Some(err);
            }
        }
        self.last_checked = Some(at);
    }
}

#[derive(Debug, Clone)]
pub struct WaitResult {
    pub success: bool,
    pub ready: Vec<String>,
    pub not_ready: Vec<String>,
    pub errors: BTreeMap<String, ProbeError>,
    pub elapsed: Duration,
}

impl WaitResult {
    /// Partitions the final states, preserving request order.
    pub fn from_states(states: &[ResourceState], success: bool, elapsed: Duration) -> Self {
        let (ready, not_ready): (Vec<_>, Vec<_>) = states.iter().partition(|state| state.ready);
        let errors = states
            .iter()
            .filter_map(|state| {
                state
                    .error
                    .as_ref()
                    .map(|err| (state.resource.clone(), err.clone()))
            })
            .collect();
        Self {
            success,
            ready: ready.into_iter().map(|s| s.resource.clone()).collect(),
            not_ready: not_ready.into_iter().map(|s| s.resource.clone()).collect(),
            errors,
            elapsed,
        }
    }

    pub fn empty() -> Self {
        Self {
            success: true,
            ready: Vec::new(),
            not_ready: Vec::new(),
            errors: BTreeMap::new(),
            elapsed: Duration::ZERO,
        }
    }
}
