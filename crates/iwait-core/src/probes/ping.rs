use std::process::Stdio;

use tokio::process::Command;

use crate::error::ProbeError;

/// Sends a single ICMP echo through the system `ping` binary.
pub struct PingProbe;

impl PingProbe {
    pub async fn check(&self, host: &str) -> Result<bool, ProbeError> {
        let mut command = ping_command(host);
        let status = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|err| ProbeError::Command {
                command: "ping".into(),
                reason: err.to_string(),
            })?;
        tracing::trace!(host, success = status.success(), "ping finished");
        Ok(status.success())
    }
}

#[cfg(windows)]
fn ping_command(host: &str) -> Command {
    let mut command = Command::new("ping");
    command.args(["-n", "1", "-w", "1000", host]);
    command
}

#[cfg(not(windows))]
fn ping_command(host: &str) -> Command {
    let mut command = Command::new("ping");
    command.args(["-c", "1", "-W", "1", host]);
    command
}
