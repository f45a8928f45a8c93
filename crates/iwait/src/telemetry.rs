use anyhow::{Result, anyhow};
use tracing::metadata::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset.
pub fn default_level(verbose: bool, log: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else if log {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

/// Installs a stderr fmt subscriber so stdout stays free for the outcome.
pub fn init(verbose: bool, log: bool) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose, log).into())
        .from_env_lossy()
        .add_directive("hyper=off".parse()?)
        .add_directive("reqwest=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("logging already initialized: {err}"))
}
