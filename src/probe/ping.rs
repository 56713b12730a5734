use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{instrument, trace};

use super::Prober;

/// ICMP echo through the system `ping` binary
///
/// Using the system binary avoids needing raw socket privileges in this
/// process.
#[derive(Debug, Clone)]
pub struct PingProber {
    program: String,
    timeout: Duration,
}

impl PingProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: String::from("ping"),
            timeout,
        }
    }

    /// Use a different ping executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self, address: IpAddr) -> Vec<String> {
        let mut args = Vec::with_capacity(6);
        if address.is_ipv6() {
            args.push(String::from("-6"));
        }
        args.extend([
            String::from("-c"),
            String::from("1"),
            String::from("-W"),
            self.timeout.as_secs().max(1).to_string(),
            address.to_string(),
        ]);
        args
    }

    /// Run one ping and report why it failed, if it did
    #[instrument(skip(self))]
    pub async fn ping(&self, address: IpAddr) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .args(self.args(address))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let child = command.status();

        // the binary has its own timeout; this one covers a hung process
        let status = tokio::time::timeout(self.timeout + Duration::from_secs(1), child)
            .await
            .context("ping timed out")?
            .with_context(|| format!("failed to run {}", self.program))?;

        if !status.success() {
            anyhow::bail!("no reply from {address} ({status})");
        }

        Ok(())
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn check(&self, address: IpAddr) -> bool {
        match self.ping(address).await {
            Ok(()) => true,
            Err(e) => {
                trace!("{address} unreachable: {e:#}");
                false
            }
        }
    }
}
