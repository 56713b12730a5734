//! Passive host detection in free text
//!
//! Messages that are not commands are scanned for IPv4 literals; when none
//! are present, hostnames are looked for instead. Every candidate that is not
//! already tracked gets a monitor of its own.
//!
//! Reactions work the same way, scoped to the reacted message. If that
//! message already produced checks, the reaction adds (or removes) the
//! reacting user as a watcher instead.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, instrument, trace};

use crate::error::RegistryError;
use crate::registry::{Origin, Trigger, normalize_key};
use crate::resolver;
use crate::settings::{SettingsResult, SettingsStore};
use crate::tracker::{CheckRequest, Tracker};

static RE_UNLINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<http[^|]+\|([^>]+)>").expect("unlink pattern is valid"));

static RE_IPV4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").expect("ipv4 pattern is valid")
});

static RE_HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[a-zA-Z]|[a-zA-Z]{2}|[a-zA-Z][0-9]|[0-9][a-zA-Z]|[a-zA-Z0-9][a-zA-Z0-9._-]{1,61}[a-zA-Z0-9])\.(?:[a-zA-Z]{2,6}|[a-zA-Z0-9-]{2,30}\.[a-zA-Z]{2,3})$",
    )
    .expect("hostname pattern is valid")
});

/// Replace `<http...|label>` link markup with its label
pub fn unlink(text: &str) -> String {
    RE_UNLINK.replace_all(text, "$1").into_owned()
}

/// Valid IPv4 literals in `text`, in order of appearance
pub fn find_ipv4(text: &str) -> Vec<Ipv4Addr> {
    RE_IPV4
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Whitespace-separated words of `text` that look like hostnames
pub fn find_hostnames(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|word| RE_HOSTNAME.is_match(word))
        .collect()
}

/// What happened to one candidate found in a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// A new check was started
    Started { key: String, address: IpAddr },

    /// The address is already monitored (`source` of the existing entry)
    AlreadyTracked { address: IpAddr, source: String },

    /// A reaction changed the watchers of an existing check
    WatcherUpdated { watcher: String, added: bool },
}

/// A reaction on a message
#[derive(Debug, Clone)]
pub struct Reaction<'a> {
    /// Reaction name, e.g. `eyes`
    pub name: &'a str,

    /// User who added or removed the reaction
    pub user: &'a str,

    pub added: bool,
}

pub struct Detector {
    tracker: Tracker,
    settings: Arc<dyn SettingsStore>,
    reaction_trigger: String,
    incoming_channel: Option<String>,
}

impl Detector {
    pub fn new(
        tracker: Tracker,
        settings: Arc<dyn SettingsStore>,
        reaction_trigger: impl Into<String>,
        incoming_channel: Option<String>,
    ) -> Self {
        Self {
            tracker,
            settings,
            reaction_trigger: reaction_trigger.into(),
            incoming_channel,
        }
    }

    /// Scan a regular message written by `origin.user`
    ///
    /// Messages from channels other than the configured incoming channel are
    /// ignored; an empty channel is a direct conversation and always scanned.
    #[instrument(skip(self, origin, text), fields(user = %origin.user, channel = %origin.channel))]
    pub async fn on_message(&self, origin: &Origin, text: &str) -> SettingsResult<Vec<Detection>> {
        if !self.accepts_channel(&origin.channel) {
            trace!("skipping: not the incoming channel");
            return Ok(Vec::new());
        }

        self.scan(origin, text, Trigger::Message).await
    }

    /// Handle a reaction on the message identified by `origin`
    #[instrument(skip(self, origin, text), fields(message = %origin.timestamp))]
    pub async fn on_reaction(
        &self,
        origin: &Origin,
        text: &str,
        reaction: Reaction<'_>,
    ) -> SettingsResult<Vec<Detection>> {
        if reaction.name != self.reaction_trigger || reaction.user.is_empty() {
            return Ok(Vec::new());
        }

        let registry = self.tracker.registry();
        if !origin.timestamp.is_empty() && registry.exists(&origin.timestamp).await.is_some() {
            registry
                .edit_watcher(&origin.timestamp, reaction.user, reaction.added)
                .await;
            return Ok(vec![Detection::WatcherUpdated {
                watcher: reaction.user.to_string(),
                added: reaction.added,
            }]);
        }

        // removing a reaction from an untracked message does nothing
        if !reaction.added {
            return Ok(Vec::new());
        }

        self.scan(origin, text, Trigger::Reaction(reaction.name.to_string()))
            .await
    }

    fn accepts_channel(&self, channel: &str) -> bool {
        match &self.incoming_channel {
            Some(incoming) => channel.is_empty() || channel.eq_ignore_ascii_case(incoming),
            None => true,
        }
    }

    async fn scan(&self, origin: &Origin, text: &str, trigger: Trigger) -> SettingsResult<Vec<Detection>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        if self.settings.get(&origin.user).await?.checks_disabled {
            debug!("automatic checks disabled for {}", origin.user);
            return Ok(Vec::new());
        }

        let text = unlink(text);
        let candidates = self.candidates(&text).await;

        let mut source = origin.channel.clone();
        if matches!(trigger, Trigger::Reaction(_)) {
            source = format!("via reaction in {source}");
        }

        let registry = self.tracker.registry();
        let mut detections = Vec::new();

        for (key, address) in candidates {
            if let Some(source) = registry.exists(&address.to_string()).await {
                detections.push(Detection::AlreadyTracked { address, source });
                continue;
            }

            let request = CheckRequest {
                key,
                address,
                origin: origin.clone(),
                trigger: trigger.clone(),
                source: source.clone(),
            };
            detections.extend(self.start(request).await);
        }

        Ok(detections)
    }

    /// Start one check; a key taken under another address reports that entry
    async fn start(&self, request: CheckRequest) -> Option<Detection> {
        let key = request.key.clone();
        let address = request.address;

        match self.tracker.track(request).await {
            Ok(_) => Some(Detection::Started { key, address }),
            Err(RegistryError::AlreadyTracked(_)) => {
                let host = self.tracker.registry().find(&key).await?;
                debug!("{key} already tracked as {}", host.address());
                Some(Detection::AlreadyTracked {
                    address: host.address(),
                    source: host.source().to_string(),
                })
            }
            Err(e) => {
                debug!("not tracking {key}: {e}");
                None
            }
        }
    }

    /// Keys and addresses to check: IPv4 literals if any, else resolvable hostnames
    async fn candidates(&self, text: &str) -> Vec<(String, IpAddr)> {
        let ips = find_ipv4(text);
        if !ips.is_empty() {
            return ips
                .into_iter()
                .map(|ip| (ip.to_string(), IpAddr::V4(ip)))
                .collect();
        }

        let hostnames = find_hostnames(text);
        resolver::resolve_all(&hostnames)
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(resolved) => Some((normalize_key(&resolved.query), resolved.address)),
                Err(e) => {
                    debug!("{e}");
                    None
                }
            })
            .collect()
    }
}
