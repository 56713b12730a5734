//! Shared fakes for integration tests

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hostwatch::{
    config::MonitorSettings,
    notify::Notifier,
    probe::Prober,
    registry::{Origin, Registry},
    tracker::Tracker,
};
use parking_lot::Mutex;

/// Prober answering from a script, then with a fixed default
pub struct ScriptedProber {
    script: Mutex<VecDeque<bool>>,
    default: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn new(script: impl IntoIterator<Item = bool>, default: bool) -> Arc<Self> {
        Self::slow(script, default, Duration::ZERO)
    }

    /// Every probe takes `delay` before answering
    pub fn slow(script: impl IntoIterator<Item = bool>, default: bool, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            default,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(reachable: bool) -> Arc<Self> {
        Self::new([], reachable)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn check(&self, _address: IpAddr) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reachable = self.script.lock().pop_front().unwrap_or(self.default);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        reachable
    }
}

/// Notifier that keeps every delivered message
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Origin, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn texts(&self) -> Vec<String> {
        self.messages.lock().iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn origins(&self) -> Vec<Origin> {
        self.messages.lock().iter().map(|(origin, _)| origin.clone()).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, origin: &Origin, text: &str) -> anyhow::Result<()> {
        self.messages.lock().push((origin.clone(), text.to_string()));
        Ok(())
    }
}

pub fn origin(user: &str) -> Origin {
    Origin::new(user, "ops", "1700000000.000100")
}

pub fn tracker(prober: Arc<ScriptedProber>, notifier: Arc<RecordingNotifier>, settings: MonitorSettings) -> Tracker {
    Tracker::new(Registry::new(), prober, notifier, settings)
}
