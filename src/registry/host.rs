//! Monitored host entries and their per-host state
//!
//! A [`MonitoredHost`] is shared between the registry and the host's monitor
//! task. Its immutable parts (key, address, origin) are plain fields; the
//! mutable reachability state lives behind a per-host lock so snapshots taken
//! by the registry never race with the monitor's writes.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::notify::Notifier;

use super::identity::Identity;

/// Opaque reference to whoever requested a check
///
/// The registry only compares these fields; the notifier gets the whole
/// value back when a status message is delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Origin {
    /// User that asked for the check (or wrote the detected message)
    pub user: String,

    /// Conversation/channel identifier
    pub channel: String,

    /// Timestamp identifying the originating message
    pub timestamp: String,
}

impl Origin {
    pub fn new(user: impl Into<String>, channel: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            channel: channel.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// How an entry came to be tracked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reaction", rename_all = "snake_case")]
pub enum Trigger {
    /// Explicit `!check` command
    Command,

    /// Address detected in a regular message
    Message,

    /// Reaction added to a message containing an address
    Reaction(String),
}

impl Trigger {
    /// Passive entries were not explicitly requested and are dropped once
    /// their last watcher leaves.
    pub fn is_passive(&self) -> bool {
        !matches!(self, Trigger::Command)
    }
}

/// Reachability state of a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Initializing,
    Online,
    Offline,
    Terminated,
}

/// Edge produced by recording a probe outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State did not change
    Unchanged,

    /// Host came back; carries the accumulated downtime
    CameOnline { total_downtime: Duration },

    /// Host stopped answering
    WentOffline,
}

/// Mutable per-host state, written only by the host's monitor task
#[derive(Debug, Clone)]
pub struct HostState {
    pub status: HostStatus,
    pub last_online: Option<Instant>,
    pub last_offline: Option<Instant>,
    pub total_downtime: Duration,
    pub has_sent_first_status: bool,
    pub watchers: Vec<String>,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            status: HostStatus::Initializing,
            last_online: None,
            last_offline: None,
            total_downtime: Duration::ZERO,
            has_sent_first_status: false,
            watchers: Vec::new(),
        }
    }
}

impl HostState {
    pub fn is_online(&self) -> bool {
        self.status == HostStatus::Online
    }

    /// Record the outcome of the very first probe
    pub fn start(&mut self, reachable: bool, now: Instant) {
        if reachable {
            self.status = HostStatus::Online;
            self.last_online = Some(now);
        } else {
            self.status = HostStatus::Offline;
            self.last_offline = Some(now);
        }
    }

    /// Record a tick in which the host answered
    pub fn record_reachable(&mut self, now: Instant) -> Transition {
        let transition = if self.is_online() {
            Transition::Unchanged
        } else {
            self.accumulate_downtime(now);
            self.status = HostStatus::Online;
            Transition::CameOnline {
                total_downtime: self.total_downtime,
            }
        };

        self.last_online = Some(now);
        transition
    }

    /// Record a tick in which the host did not answer
    pub fn record_unreachable(&mut self, now: Instant) -> Transition {
        let transition = if self.is_online() {
            self.status = HostStatus::Offline;
            Transition::WentOffline
        } else {
            self.accumulate_downtime(now);
            Transition::Unchanged
        };

        self.last_offline = Some(now);
        transition
    }

    /// Time the host has been healthy: since the last offline observation,
    /// or since `created_at` if it was never seen offline.
    pub fn healthy_for(&self, created_at: Instant, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_offline.unwrap_or(created_at))
    }

    fn accumulate_downtime(&mut self, now: Instant) {
        if let Some(last_offline) = self.last_offline {
            self.total_downtime += now.saturating_duration_since(last_offline);
        }
    }

    /// Add or remove a watcher; returns true when a removal left the set empty
    fn edit_watcher(&mut self, watcher: &str, add: bool) -> bool {
        if add {
            if !self.watchers.iter().any(|w| w == watcher) {
                self.watchers.push(watcher.to_string());
            }
            return false;
        }

        let before = self.watchers.len();
        self.watchers.retain(|w| w != watcher);
        before != self.watchers.len() && self.watchers.is_empty()
    }
}

/// One tracked endpoint
pub struct MonitoredHost {
    identity: Identity,
    address: IpAddr,
    origin: Origin,
    trigger: Trigger,
    source: String,
    created_at: Instant,
    added: DateTime<Utc>,
    cancel: CancellationToken,
    notifier: Arc<dyn Notifier>,
    state: Mutex<HostState>,
}

impl std::fmt::Debug for MonitoredHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoredHost")
            .field("key", &self.identity.key())
            .field("address", &self.address)
            .field("origin", &self.origin)
            .field("trigger", &self.trigger)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl MonitoredHost {
    pub fn new(
        key: &str,
        address: IpAddr,
        origin: Origin,
        trigger: Trigger,
        source: impl Into<String>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            identity: Identity::new(key, address, &origin.timestamp),
            address,
            origin,
            trigger,
            source: source.into(),
            created_at: Instant::now(),
            added: Utc::now(),
            cancel: CancellationToken::new(),
            notifier,
            state: Mutex::new(HostState::default()),
        }
    }

    pub fn key(&self) -> &str {
        self.identity.key()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Human readable label describing where the check came from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Copy of the current mutable state
    pub fn state(&self) -> HostState {
        self.state.lock().clone()
    }

    pub fn is_online(&self) -> bool {
        self.state.lock().is_online()
    }

    pub fn has_sent_first_status(&self) -> bool {
        self.state.lock().has_sent_first_status
    }

    pub fn watchers(&self) -> Vec<String> {
        self.state.lock().watchers.clone()
    }

    /// Mutate the reachability state. Reserved for the owning monitor task.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut HostState) -> R) -> R {
        f(&mut self.state.lock())
    }

    /// Add/remove a watcher. The origin user is never added as a watcher.
    pub(crate) fn edit_watcher(&self, watcher: &str, add: bool) -> bool {
        if add && watcher == self.origin.user {
            return false;
        }
        self.state.lock().edit_watcher(watcher, add)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Deliver a status message to the origin (and any watchers)
    ///
    /// Delivery failures are logged and otherwise ignored.
    pub async fn send(&self, text: &str) {
        let text = {
            let mut state = self.state.lock();
            state.has_sent_first_status = true;
            if state.watchers.is_empty() {
                text.to_string()
            } else {
                let mentions: Vec<String> = state.watchers.iter().map(|w| format!("@{w}")).collect();
                format!("{}: {text}", mentions.join(" "))
            }
        };

        trace!(host = %self.key(), "sending status: {text}");

        if let Err(e) = self.notifier.send(&self.origin, &text).await {
            warn!(host = %self.key(), "failed to deliver status message: {e:#}");
        }
    }

    /// Serializable view of this host
    pub fn snapshot(&self) -> HostSnapshot {
        let now = Instant::now();
        let state = self.state();

        HostSnapshot {
            key: self.key().to_string(),
            address: self.address,
            source: self.source.clone(),
            origin: self.origin.clone(),
            trigger: self.trigger.clone(),
            added: self.added,
            watching_secs: now.saturating_duration_since(self.created_at).as_secs(),
            status: state.status,
            online: state.is_online(),
            last_online_secs_ago: state
                .last_online
                .map(|t| now.saturating_duration_since(t).as_secs()),
            last_offline_secs_ago: state
                .last_offline
                .map(|t| now.saturating_duration_since(t).as_secs()),
            total_downtime_secs: state.total_downtime.as_secs(),
            has_sent_first_status: state.has_sent_first_status,
            watchers: state.watchers,
        }
    }
}

/// Point-in-time view of a host, used by the HTTP endpoint
#[derive(Debug, Clone, Serialize)]
pub struct HostSnapshot {
    pub key: String,
    pub address: IpAddr,
    pub source: String,
    pub origin: Origin,
    pub trigger: Trigger,
    pub added: DateTime<Utc>,
    pub watching_secs: u64,
    pub status: HostStatus,
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_online_secs_ago: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_offline_secs_ago: Option<u64>,
    pub total_downtime_secs: u64,
    pub has_sent_first_status: bool,
    pub watchers: Vec<String>,
}
