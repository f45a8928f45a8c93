use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::WaitError;

/// Policy deciding how many ready resources complete a wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    All,
    Any,
    /// Like `Any`, but a round stops as soon as one probe reports ready.
    Race,
    Threshold,
}

impl Strategy {
    /// Whether `ready` out of `total` resources completes the wait.
    ///
    /// An empty resource set is vacuously complete under every strategy.
    pub fn is_satisfied(self, ready: usize, total: usize, threshold: usize) -> bool {
        if total == 0 {
            return true;
        }
        match self {
            Self::All => ready == total,
            Self::Any | Self::Race => ready > 0,
            Self::Threshold => ready >= threshold,
        }
    }

    /// Whether a single ready verdict should end the current round early.
    pub fn stops_on_first_ready(self) -> bool {
        matches!(self, Self::Race)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
            Self::Race => "race",
            Self::Threshold => "threshold",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = WaitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            "race" => Ok(Self::Race),
            "threshold" => Ok(Self::Threshold),
            other => Err(WaitError::config(format!("unsupported strategy `{other}`"))),
        }
    }
}
