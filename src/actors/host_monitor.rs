//! HostMonitorActor - Watches the reachability of a single host
//!
//! Every registered host gets one monitor task. The task owns the host's
//! reachability state: it is the only writer of `online`, the timestamps and
//! the accumulated downtime.
//!
//! ## Message Flow
//!
//! ```text
//! initial probe → [poll wait → lifetime check → N sub-probes → transition → notify]*
//!                      ↑                              ↑
//!                      └──── cancellation gate ───────┘
//! ```
//!
//! ## Termination
//!
//! The loop ends on one of three events, whichever comes first:
//!
//! 1. the forced lifetime cap is exceeded (self-removal with a reason)
//! 2. the host stayed healthy past the removal timeout (self-removal with a reason)
//! 3. the cancellation gate was closed by someone else; the canceller owns
//!    the removal and its message, so the task leaves silently

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace};

use crate::config::MonitorSettings;
use crate::probe::Prober;
use crate::registry::{MonitoredHost, Registry, Transition};

use super::messages::StatusMessage;

/// Actor driving the probe/notify/evict loop of one host
pub struct HostMonitorActor {
    host: Arc<MonitoredHost>,
    registry: Registry,
    prober: Arc<dyn Prober>,
    settings: MonitorSettings,
    cancel: CancellationToken,
}

impl HostMonitorActor {
    pub fn new(
        host: Arc<MonitoredHost>,
        registry: Registry,
        prober: Arc<dyn Prober>,
        settings: MonitorSettings,
    ) -> Self {
        let cancel = host.cancel_token();
        Self {
            host,
            registry,
            prober,
            settings,
            cancel,
        }
    }

    /// Run the actor's main loop until the host is evicted or cancelled
    #[instrument(skip(self), fields(host = %self.host.key()))]
    pub async fn run(self) {
        debug!("starting host monitor for {}", self.host.address());

        if self.start().await {
            self.watch().await;
        }

        // no-op unless the loop ended without removing its own entry
        self.registry.remove_host(&self.host, "").await;

        debug!("host monitor stopped");
    }

    /// Initial probe; returns false if the host was cancelled meanwhile
    async fn start(&self) -> bool {
        let address = self.host.address();
        let reachable = self.prober.check(address).await;

        if self.cancel.is_cancelled() {
            return false;
        }

        self.host.update(|state| state.start(reachable, Instant::now()));
        trace!("initial probe: reachable={reachable}");

        if self.settings.notify_on_start {
            let message = if reachable {
                StatusMessage::Online(address)
            } else {
                StatusMessage::Offline(address)
            };
            self.host.send(&message.to_string()).await;
        }

        true
    }

    async fn watch(&self) {
        let address = self.host.address();

        loop {
            if !self.wait(self.settings.poll_interval).await {
                return;
            }

            if self.host.created_at().elapsed() > self.settings.forced_timeout {
                info!("forced monitoring duration exceeded");
                let message = StatusMessage::ForcedTimeout {
                    address,
                    limit: self.settings.forced_timeout,
                };
                self.registry.remove_host(&self.host, &message.to_string()).await;
                return;
            }

            let Some(reachable) = self.probe_round().await else {
                return;
            };

            let now = Instant::now();

            if !reachable {
                let transition = self.host.update(|state| state.record_unreachable(now));
                if transition == Transition::WentOffline {
                    info!("{address} went offline");
                    self.host.send(&StatusMessage::NowOffline(address).to_string()).await;
                }
                continue;
            }

            let transition = self.host.update(|state| state.record_reachable(now));
            if let Transition::CameOnline { total_downtime } = transition {
                info!("{address} came back online");
                let message = StatusMessage::NowOnline {
                    address,
                    downtime: total_downtime,
                };
                self.host.send(&message.to_string()).await;
            }

            let created_at = self.host.created_at();
            let healthy_for = self.host.update(|state| state.healthy_for(created_at, now));
            if healthy_for > self.settings.removal_timeout {
                info!("healthy for {healthy_for:?}, removing");
                let message = StatusMessage::RemovalTimeout {
                    address,
                    limit: self.settings.removal_timeout,
                };
                self.registry.remove_host(&self.host, &message.to_string()).await;
                return;
            }

            // healthy hosts are re-checked less eagerly to dampen flapping
            if !self.wait(self.settings.recovery_damping).await {
                return;
            }
        }
    }

    /// One tick worth of sub-probes
    ///
    /// Returns `None` if cancelled. The host is unreachable only when a
    /// strict majority of the sub-probes failed.
    async fn probe_round(&self) -> Option<bool> {
        let address = self.host.address();
        let attempts = self.settings.probe_attempts.max(1);
        let mut failures = 0;

        for attempt in 1..=attempts {
            if !self.wait(self.settings.probe_spacing).await {
                return None;
            }

            trace!("pinging {address} [{attempt}/{attempts}]");
            if !self.prober.check(address).await {
                failures += 1;
            }
        }

        // a probe may outlive its entry
        if self.cancel.is_cancelled() {
            return None;
        }

        Some(is_reachable(failures, attempts))
    }

    /// Sleep unless cancelled first; returns false on cancellation
    async fn wait(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                trace!("cancelled");
                false
            }
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

/// Majority policy: a tick is unreachable only if more than half the
/// sub-probes failed
pub fn is_reachable(failures: u32, attempts: u32) -> bool {
    failures * 2 <= attempts
}

/// Handle to a running host monitor
pub struct HostHandle {
    host: Arc<MonitoredHost>,
    task: JoinHandle<()>,
}

impl HostHandle {
    /// Spawn the monitor task for an entry that is already in the registry
    pub fn spawn(
        host: Arc<MonitoredHost>,
        registry: Registry,
        prober: Arc<dyn Prober>,
        settings: MonitorSettings,
    ) -> Self {
        let actor = HostMonitorActor::new(host.clone(), registry, prober, settings);
        let task = tokio::spawn(actor.run());

        Self { host, task }
    }

    pub fn host(&self) -> &Arc<MonitoredHost> {
        &self.host
    }

    /// Wait for the monitor task to end
    pub async fn join(self) -> anyhow::Result<()> {
        self.task.await?;
        Ok(())
    }
}
