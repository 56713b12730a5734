//! Registry of monitored hosts
//!
//! The registry maps normalized tracking keys to [`MonitoredHost`] entries.
//! Every operation is serialized through one coarse lock covering the whole
//! map. The lock is only held while the map is read or mutated; status
//! messages produced by a removal are sent after it has been released.
//!
//! Removal always goes through [`Registry::remove`] / [`Registry::remove_host`]
//! (or the bulk variants built on the same routine), which takes the entry out
//! of the map, closes its cancellation gate and optionally sends a final
//! message. Only the caller that actually took the entry out sends anything,
//! so a host gets at most one final notification.

pub mod host;
pub mod identity;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::actors::messages::StatusMessage;
use crate::error::RegistryError;
use crate::util::format_duration;

pub use host::{HostSnapshot, HostState, HostStatus, MonitoredHost, Origin, Transition, Trigger};
pub use identity::{Glob, Identity, normalize_key};

/// Reason used when hosts are cancelled in bulk
pub const CANCEL_REASON: &str = "checks cancelled";

/// Which entries a bulk removal targets
#[derive(Debug)]
enum Selector {
    Pattern(Glob),
    User(String),
    All,
}

impl Selector {
    fn new(pattern: &str, user: &str) -> Result<Self, RegistryError> {
        if !pattern.is_empty() {
            Ok(Selector::Pattern(Glob::new(pattern)?))
        } else if !user.is_empty() {
            Ok(Selector::User(user.to_string()))
        } else {
            Ok(Selector::All)
        }
    }

    fn selects(&self, host: &MonitoredHost) -> bool {
        match self {
            Selector::Pattern(glob) => host.identity().matches_glob(glob),
            Selector::User(user) => &host.origin().user == user,
            Selector::All => true,
        }
    }
}

/// Concurrency-safe mapping from tracking key to monitored host
#[derive(Debug, Clone, Default)]
pub struct Registry {
    inv: Arc<Mutex<HashMap<String, Arc<MonitoredHost>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a host under its (already normalized) key
    ///
    /// Fails with [`RegistryError::AlreadyTracked`] if the key is taken.
    #[instrument(skip_all, fields(key = %host.key()))]
    pub async fn add(&self, host: Arc<MonitoredHost>) -> Result<(), RegistryError> {
        let mut inv = self.inv.lock().await;

        if inv.contains_key(host.key()) {
            debug!("rejecting duplicate entry");
            return Err(RegistryError::AlreadyTracked(host.key().to_string()));
        }

        info!("added: {}", host.address());
        inv.insert(host.key().to_string(), host);
        Ok(())
    }

    /// Look up a host by key, address or originating conversation timestamp
    ///
    /// Returns the source label of the first matching entry.
    pub async fn exists(&self, id: &str) -> Option<String> {
        self.find(id).await.map(|host| host.source().to_string())
    }

    /// Same lookup as [`Registry::exists`], returning the entry itself
    pub async fn find(&self, id: &str) -> Option<Arc<MonitoredHost>> {
        let inv = self.inv.lock().await;
        inv.values().find(|host| host.identity().matches(id)).cloned()
    }

    /// Remove an entry by key
    ///
    /// Idempotent: returns false if nothing was tracked under `key`. If the
    /// entry never sent a status message and `reason` is non-empty, `reason`
    /// is delivered as its final message.
    pub async fn remove(&self, key: &str, reason: &str) -> bool {
        let key = normalize_key(key);
        let removed = self.inv.lock().await.remove(&key);

        match removed {
            Some(host) => {
                finish(host, reason).await;
                true
            }
            None => false,
        }
    }

    /// Remove exactly this entry, leaving any newer entry under the same key alone
    pub async fn remove_host(&self, host: &Arc<MonitoredHost>, reason: &str) -> bool {
        let removed = {
            let mut inv = self.inv.lock().await;
            match inv.get(host.key()) {
                Some(current) if Arc::ptr_eq(current, host) => inv.remove(host.key()),
                _ => None,
            }
        };

        match removed {
            Some(host) => {
                finish(host, reason).await;
                true
            }
            None => false,
        }
    }

    /// Bulk cancellation
    ///
    /// - non-empty `pattern`: every entry whose key or address matches the glob
    /// - else non-empty `user`: every entry requested by that user
    /// - else: everything
    ///
    /// Returns the number of removed entries.
    #[instrument(skip(self))]
    pub async fn glob_remove(&self, pattern: &str, user: &str) -> Result<usize, RegistryError> {
        let selector = Selector::new(pattern, user)?;

        let removed: Vec<Arc<MonitoredHost>> = {
            let mut inv = self.inv.lock().await;
            let keys: Vec<String> = inv
                .iter()
                .filter(|(_, host)| selector.selects(host))
                .map(|(key, _)| key.clone())
                .collect();

            keys.iter().filter_map(|key| inv.remove(key)).collect()
        };

        let count = removed.len();
        debug!("cancelling {count} checks");

        join_all(removed.into_iter().map(|host| finish(host, CANCEL_REASON))).await;

        Ok(count)
    }

    /// Add or remove a watcher on every entry registered from the message
    /// with timestamp `conversation`
    ///
    /// When a removal empties the watcher set of a passively created entry,
    /// that entry is dropped after announcing it.
    #[instrument(skip(self))]
    pub async fn edit_watcher(&self, conversation: &str, watcher: &str, add: bool) {
        let dropped: Vec<Arc<MonitoredHost>> = {
            let mut inv = self.inv.lock().await;
            let mut emptied = Vec::new();
            for (key, host) in inv.iter() {
                if host.origin().timestamp != conversation {
                    continue;
                }

                if host.edit_watcher(watcher, add) && host.trigger().is_passive() {
                    emptied.push(key.clone());
                }
            }

            emptied.iter().filter_map(|key| inv.remove(key)).collect()
        };

        for host in dropped {
            host.send(&StatusMessage::NoLongerMonitoring(host.address()).to_string())
                .await;
            finish(host, "").await;
        }
    }

    /// Column-aligned, key-sorted listing of all tracked hosts
    ///
    /// Returns an empty string if nothing is tracked.
    pub async fn dump(&self) -> String {
        let inv = self.inv.lock().await;

        let mut keys: Vec<&String> = inv.keys().collect();
        keys.sort();
        let width = keys.iter().map(|key| key.len()).max().unwrap_or(0);
        let now = Instant::now();

        let mut out = String::new();
        for key in keys {
            let host = &inv[key];
            let watching = format_duration(now.saturating_duration_since(host.created_at()));
            out.push_str(&format!(
                "q: {key:<width$} | ip: {:<15} | watching: {watching:>8} | online: {:<5} | src: {}\n",
                host.address().to_string(),
                host.is_online(),
                host.source(),
            ));
        }

        out
    }

    /// Serializable snapshot of every entry, sorted by key
    pub async fn snapshot(&self) -> Vec<HostSnapshot> {
        let inv = self.inv.lock().await;
        let mut hosts: Vec<HostSnapshot> = inv.values().map(|host| host.snapshot()).collect();
        hosts.sort_by(|a, b| a.key.cmp(&b.key));
        hosts
    }

    pub async fn len(&self) -> usize {
        self.inv.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inv.lock().await.is_empty()
    }

    /// Keys of all tracked entries, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inv.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Final step of every removal path; the entry is already out of the map
async fn finish(host: Arc<MonitoredHost>, reason: &str) {
    host.cancel();

    if !reason.is_empty() && !host.has_sent_first_status() {
        host.send(reason).await;
    }

    info!(key = %host.key(), "removed: {}", host.address());
}
