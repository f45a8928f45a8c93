use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::WaitError;
use crate::strategy::Strategy;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(250);
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(750);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TCP_TIMEOUT: Duration = Duration::from_millis(300);

/// Decides whether an HTTP status code means "ready".
#[derive(Clone)]
pub struct StatusValidator {
    accept: Arc<dyn Fn(u16) -> bool + Send + Sync>,
    label: String,
}

impl StatusValidator {
    /// Accepts any 2xx status.
    pub fn success() -> Self {
        Self::ranges(vec![200..=299])
    }

    pub fn ranges(ranges: Vec<RangeInclusive<u16>>) -> Self {
        let label = ranges
            .iter()
            .map(|range| {
                if range.start() == range.end() {
                    range.start().to_string()
                } else {
                    format!("{}-{}", range.start(), range.end())
                }
            })
            .collect::<Vec<_>>()
            .join(",");
        Self {
            accept: Arc::new(move |status| ranges.iter().any(|range| range.contains(&status))),
            label,
        }
    }

    pub fn from_fn(accept: impl Fn(u16) -> bool + Send + Sync + 'static) -> Self {
        Self {
            accept: Arc::new(accept),
            label: "custom".into(),
        }
    }

    pub fn accepts(&self, status: u16) -> bool {
        (self.accept)(status)
    }
}

impl Default for StatusValidator {
    fn default() -> Self {
        Self::success()
    }
}

impl fmt::Debug for StatusValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StatusValidator").field(&self.label).finish()
    }
}

impl FromStr for StatusValidator {
    type Err = WaitError;

    /// Parses comma separated codes or inclusive ranges, e.g. `200-299,304`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut ranges = Vec::new();
        for part in value.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let (start, end) = part.split_once('-').unwrap_or((part, part));
            let start = parse_status(start, value)?;
            let end = parse_status(end, value)?;
            if start > end {
                return Err(WaitError::config(format!(
                    "status range `{part}` is reversed"
                )));
            }
            ranges.push(start..=end);
        }
        if ranges.is_empty() {
            return Err(WaitError::config("status list is empty"));
        }
        Ok(Self::ranges(ranges))
    }
}

fn parse_status(raw: &str, whole: &str) -> Result<u16, WaitError> {
    raw.trim()
        .parse::<u16>()
        .ok()
        .filter(|code| (100..=999).contains(code))
        .ok_or_else(|| WaitError::config(format!("invalid status code in `{whole}`")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl FromStr for BasicAuth {
    type Err = WaitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (username, password) = value.split_once(':').unwrap_or((value, ""));
        if username.is_empty() {
            return Err(WaitError::config("basic auth requires a username"));
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Caller-supplied options. Every field but `resources` is optional and
/// falls back to a default when resolved into a [`WaitConfig`].
#[derive(Debug, Clone, Default)]
pub struct WaitOptions {
    pub resources: Vec<String>,
    pub delay: Option<Duration>,
    pub interval: Option<Duration>,
    pub timeout: Option<Duration>,
    pub strategy: Option<Strategy>,
    pub threshold: Option<usize>,
    pub reverse: Option<bool>,
    pub window: Option<Duration>,
    pub simultaneous: Option<usize>,
    pub http_timeout: Option<Duration>,
    pub headers: BTreeMap<String, String>,
    pub validate_status: Option<StatusValidator>,
    pub follow_redirect: Option<bool>,
    pub basic_auth: Option<BasicAuth>,
    pub tcp_timeout: Option<Duration>,
    pub dir_not_empty: Option<bool>,
    pub cancellation: Option<CancellationToken>,
    pub verbose: Option<bool>,
    pub log: Option<bool>,
}

impl WaitOptions {
    pub fn new<I, S>(resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = Some(reverse);
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_simultaneous(mut self, limit: usize) -> Self {
        self.simultaneous = Some(limit);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_validate_status(mut self, validator: StatusValidator) -> Self {
        self.validate_status = Some(validator);
        self
    }

    pub fn with_follow_redirect(mut self, follow: bool) -> Self {
        self.follow_redirect = Some(follow);
        self
    }

    pub fn with_basic_auth(mut self, auth: BasicAuth) -> Self {
        self.basic_auth = Some(auth);
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    pub fn with_tcp_timeout(mut self, timeout: Duration) -> Self {
        self.tcp_timeout = Some(timeout);
        self
    }

    pub fn with_dir_not_empty(mut self, require_entries: bool) -> Self {
        self.dir_not_empty = Some(require_entries);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = Some(log);
        self
    }

    /// Applies defaults and validates the options.
    pub fn resolve(self) -> Result<WaitConfig, WaitError> {
        let interval = self.interval.unwrap_or(DEFAULT_INTERVAL);
        if interval.is_zero() {
            return Err(WaitError::config("interval must be greater than zero"));
        }
        if self.simultaneous == Some(0) {
            return Err(WaitError::config("simultaneous must be greater than zero"));
        }

        let mut seen = HashSet::new();
        let resources: Vec<String> = self
            .resources
            .into_iter()
            .filter(|resource| seen.insert(resource.clone()))
            .collect();
        let threshold = self.threshold.unwrap_or(resources.len());
        let window = self.window.unwrap_or(DEFAULT_WINDOW).max(interval);

        Ok(WaitConfig {
            resources,
            delay: self.delay.unwrap_or_default(),
            interval,
            timeout: self.timeout,
            strategy: self.strategy.unwrap_or_default(),
            threshold,
            reverse: self.reverse.unwrap_or(false),
            window,
            simultaneous: self.simultaneous,
            http_timeout: self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
            headers: self.headers,
            validate_status: self.validate_status.unwrap_or_default(),
            follow_redirect: self.follow_redirect.unwrap_or(true),
            basic_auth: self.basic_auth,
            tcp_timeout: self.tcp_timeout.unwrap_or(DEFAULT_TCP_TIMEOUT),
            dir_not_empty: self.dir_not_empty.unwrap_or(true),
            cancellation: self.cancellation,
            verbose: self.verbose.unwrap_or(false),
            log: self.log.unwrap_or(false),
        })
    }
}

/// Fully defaulted, immutable settings for one wait operation.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    pub resources: Vec<String>,
    pub delay: Duration,
    pub interval: Duration,
    pub timeout: Option<Duration>,
    pub strategy: Strategy,
    pub threshold: usize,
    pub reverse: bool,
    /// File stabilization window, never shorter than `interval`.
    pub window: Duration,
    pub simultaneous: Option<usize>,
    pub http_timeout: Duration,
    pub headers: BTreeMap<String, String>,
    pub validate_status: StatusValidator,
    pub follow_redirect: bool,
    pub basic_auth: Option<BasicAuth>,
    pub tcp_timeout: Duration,
    pub dir_not_empty: bool,
    pub cancellation: Option<CancellationToken>,
    pub verbose: bool,
    pub log: bool,
}
