use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use iwait_core::{BasicAuth, StatusValidator, Strategy, WaitOptions};

use crate::config::OptionsFile;

#[derive(Debug, Parser)]
#[command(
    name = "iwait",
    version,
    about = "Wait for files, ports, sockets, hosts and HTTP endpoints to become ready"
)]
pub struct Cli {
    /// Resources to wait for, e.g. `tcp:5432`, `http://localhost:8080/health`, `dist/app.js`
    #[arg(value_name = "RESOURCE")]
    pub resources: Vec<String>,

    /// YAML options file; command-line values take precedence
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Delay before the first check (milliseconds or e.g. `2s`)
    #[arg(short, long, value_parser = parse_duration)]
    pub delay: Option<Duration>,

    /// Time between checks (default 250ms)
    #[arg(short, long, value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// Give up after this long (default: wait forever)
    #[arg(short, long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// How long a file size must stay unchanged (default 750ms)
    #[arg(short, long, value_parser = parse_duration)]
    pub window: Option<Duration>,

    /// Completion strategy: all, any, race or threshold
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Ready resources required by the threshold strategy
    #[arg(long)]
    pub threshold: Option<usize>,

    /// Wait for resources to become unavailable
    #[arg(short, long)]
    pub reverse: bool,

    /// Maximum probes in flight per round
    #[arg(long)]
    pub simultaneous: Option<usize>,

    /// HTTP request timeout (default 30s)
    #[arg(long, value_parser = parse_duration)]
    pub http_timeout: Option<Duration>,

    /// Extra HTTP header, repeatable
    #[arg(long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Accepted HTTP statuses (default 200-299)
    #[arg(long = "status", value_name = "RANGES")]
    pub status: Option<StatusValidator>,

    /// Do not follow HTTP redirects
    #[arg(long)]
    pub no_follow_redirect: bool,

    /// HTTP basic auth credentials
    #[arg(long, value_name = "USER:PASS")]
    pub basic_auth: Option<BasicAuth>,

    /// TCP connect timeout (default 300ms)
    #[arg(long, value_parser = parse_duration)]
    pub tcp_timeout: Option<Duration>,

    /// Treat an existing empty directory as ready
    #[arg(long)]
    pub allow_empty_dir: bool,

    /// Log every probe
    #[arg(short, long)]
    pub verbose: bool,

    /// Log progress after every round
    #[arg(short, long)]
    pub log: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Merges the options file (if any) with command-line values.
    pub fn into_options(self) -> Result<WaitOptions> {
        let mut options = match &self.config {
            Some(path) => OptionsFile::load_from_path(path)?.into_options()?,
            None => WaitOptions::default(),
        };

        options.resources.extend(self.resources);
        override_with(&mut options.delay, self.delay);
        override_with(&mut options.interval, self.interval);
        override_with(&mut options.timeout, self.timeout);
        override_with(&mut options.window, self.window);
        override_with(&mut options.strategy, self.strategy);
        override_with(&mut options.threshold, self.threshold);
        override_with(&mut options.simultaneous, self.simultaneous);
        override_with(&mut options.http_timeout, self.http_timeout);
        override_with(&mut options.validate_status, self.status);
        override_with(&mut options.basic_auth, self.basic_auth);
        override_with(&mut options.tcp_timeout, self.tcp_timeout);
        options.headers.extend(self.headers);
        if self.reverse {
            options.reverse = Some(true);
        }
        if self.no_follow_redirect {
            options.follow_redirect = Some(false);
        }
        if self.allow_empty_dir {
            options.dir_not_empty = Some(false);
        }
        if self.verbose {
            options.verbose = Some(true);
        }
        if self.log {
            options.log = Some(true);
        }
        Ok(options)
    }
}

fn override_with<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Plain integers are milliseconds; anything else goes through humantime.
fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        return raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|err| err.to_string());
    }
    humantime::parse_duration(raw).map_err(|err| err.to_string())
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in `{raw}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
