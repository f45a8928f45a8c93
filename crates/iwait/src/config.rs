use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use iwait_core::{BasicAuth, StatusValidator, Strategy, WaitOptions};
use serde::Deserialize;
use serde_yaml_bw as serde_yaml;

/// YAML options file. Durations are milliseconds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsFile {
    pub resources: Vec<String>,
    pub delay: Option<u64>,
    pub interval: Option<u64>,
    pub timeout: Option<u64>,
    pub strategy: Option<Strategy>,
    pub threshold: Option<usize>,
    pub reverse: Option<bool>,
    pub window: Option<u64>,
    pub simultaneous: Option<usize>,
    pub http_timeout: Option<u64>,
    pub headers: BTreeMap<String, String>,
    /// Accepted statuses, e.g. `200-299,304`.
    pub validate_status: Option<String>,
    pub follow_redirect: Option<bool>,
    pub basic_auth: Option<BasicAuthFile>,
    pub tcp_timeout: Option<u64>,
    pub dir_not_empty: Option<bool>,
    pub verbose: Option<bool>,
    pub log: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BasicAuthFile {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl OptionsFile {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read options file {:?}", path))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse options file {:?}", path))
    }

    pub fn into_options(self) -> Result<WaitOptions> {
        let validate_status = self
            .validate_status
            .as_deref()
            .map(str::parse::<StatusValidator>)
            .transpose()
            .context("invalid validate_status in options file")?;
        Ok(WaitOptions {
            resources: self.resources,
            delay: self.delay.map(Duration::from_millis),
            interval: self.interval.map(Duration::from_millis),
            timeout: self.timeout.map(Duration::from_millis),
            strategy: self.strategy,
            threshold: self.threshold,
            reverse: self.reverse,
            window: self.window.map(Duration::from_millis),
            simultaneous: self.simultaneous,
            http_timeout: self.http_timeout.map(Duration::from_millis),
            headers: self.headers,
            validate_status,
            follow_redirect: self.follow_redirect,
            basic_auth: self.basic_auth.map(|auth| BasicAuth {
                username: auth.username,
                password: auth.password,
            }),
            tcp_timeout: self.tcp_timeout.map(Duration::from_millis),
            dir_not_empty: self.dir_not_empty,
            cancellation: None,
            verbose: self.verbose,
            log: self.log,
        })
    }
}
