//! Entry point for starting new checks
//!
//! [`Tracker`] bundles the registry with the collaborators a monitor needs,
//! so callers (command dispatcher, passive detector) only have to describe
//! what to watch.

use std::net::IpAddr;
use std::sync::Arc;

use tracing::instrument;

use crate::actors::host_monitor::HostHandle;
use crate::config::MonitorSettings;
use crate::error::RegistryError;
use crate::notify::Notifier;
use crate::probe::Prober;
use crate::registry::{MonitoredHost, Origin, Registry, Trigger};

/// What to watch and on whose behalf
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub key: String,
    pub address: IpAddr,
    pub origin: Origin,
    pub trigger: Trigger,
    pub source: String,
}

#[derive(Clone)]
pub struct Tracker {
    registry: Registry,
    prober: Arc<dyn Prober>,
    notifier: Arc<dyn Notifier>,
    settings: MonitorSettings,
}

impl Tracker {
    pub fn new(
        registry: Registry,
        prober: Arc<dyn Prober>,
        notifier: Arc<dyn Notifier>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            registry,
            prober,
            notifier,
            settings,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Register a host and start its monitor
    ///
    /// The entry is inserted before the monitor is spawned, so a duplicate
    /// never gets a task of its own.
    #[instrument(skip_all, fields(key = %request.key))]
    pub async fn track(&self, request: CheckRequest) -> Result<HostHandle, RegistryError> {
        let host = Arc::new(MonitoredHost::new(
            &request.key,
            request.address,
            request.origin,
            request.trigger,
            request.source,
            self.notifier.clone(),
        ));

        self.registry.add(host.clone()).await?;

        Ok(HostHandle::spawn(
            host,
            self.registry.clone(),
            self.prober.clone(),
            self.settings.clone(),
        ))
    }
}
