use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{trace, warn};

/// Lower bound for `removal_timeout_secs`
pub const MIN_REMOVAL_TIMEOUT_SECS: u64 = 120;

/// Lower bound for `forced_timeout_secs`
pub const MIN_FORCED_TIMEOUT_SECS: u64 = 240;

/// User settings store configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum SettingsConfig {
    /// In-memory store (settings are lost on restart)
    Memory,

    /// SQLite database file
    Sqlite {
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for SettingsConfig {
    fn default() -> Self {
        SettingsConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./user_settings.db")
}

/// Where status messages are delivered
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Write status messages to the log
    #[default]
    Log,
    Webhook(Webhook),
    Discord(Discord),
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Webhook {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Discord {
    pub url: String,
}

/// HTTP snapshot endpoint configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_bind")]
    pub bind: SocketAddr,

    /// Bearer token required on every request
    pub token: Option<String>,
}

fn default_http_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Config {
    #[serde(default = "default_removal_timeout")]
    pub removal_timeout_secs: u64,

    #[serde(default = "default_forced_timeout")]
    pub forced_timeout_secs: u64,

    /// Announce the first probe result as soon as a check starts
    #[serde(default)]
    pub notify_on_start: bool,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_probe_spacing")]
    pub probe_spacing_secs: u64,

    #[serde(default = "default_probe_attempts")]
    pub probe_attempts: u32,

    #[serde(default = "default_recovery_damping")]
    pub recovery_damping_secs: u64,

    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_secs: u64,

    /// Reaction that starts a check on the reacted message
    #[serde(default = "default_reaction_trigger")]
    pub reaction_trigger: String,

    /// Only messages from this channel are scanned passively
    pub incoming_channel: Option<String>,

    #[serde(default)]
    pub settings: SettingsConfig,

    pub http: Option<HttpConfig>,

    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            removal_timeout_secs: default_removal_timeout(),
            forced_timeout_secs: default_forced_timeout(),
            notify_on_start: false,
            poll_interval_secs: default_poll_interval(),
            probe_spacing_secs: default_probe_spacing(),
            probe_attempts: default_probe_attempts(),
            recovery_damping_secs: default_recovery_damping(),
            ping_timeout_secs: default_ping_timeout(),
            reaction_trigger: default_reaction_trigger(),
            incoming_channel: None,
            settings: SettingsConfig::default(),
            http: None,
            notifier: NotifierConfig::default(),
        }
    }
}

fn default_removal_timeout() -> u64 {
    MIN_REMOVAL_TIMEOUT_SECS
}

fn default_forced_timeout() -> u64 {
    MIN_FORCED_TIMEOUT_SECS
}

fn default_poll_interval() -> u64 {
    5
}

fn default_probe_spacing() -> u64 {
    2
}

fn default_probe_attempts() -> u32 {
    3
}

fn default_recovery_damping() -> u64 {
    25
}

fn default_ping_timeout() -> u64 {
    2
}

fn default_reaction_trigger() -> String {
    String::from("eyes")
}

/// Timing and policy knobs of a host monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,

    /// Wait before each sub-probe of a tick
    pub probe_spacing: Duration,

    /// Sub-probes per tick; a strict majority must fail for "unreachable"
    pub probe_attempts: u32,

    /// Extra wait after a healthy tick
    pub recovery_damping: Duration,

    pub removal_timeout: Duration,
    pub forced_timeout: Duration,
    pub notify_on_start: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Config::default().monitor_settings()
    }
}

impl Config {
    /// Resolve the timing fields, clamping the timeouts to their minimums
    pub fn monitor_settings(&self) -> MonitorSettings {
        if self.removal_timeout_secs < MIN_REMOVAL_TIMEOUT_SECS {
            warn!(
                "removal_timeout_secs {} below minimum, using {MIN_REMOVAL_TIMEOUT_SECS}",
                self.removal_timeout_secs
            );
        }
        if self.forced_timeout_secs < MIN_FORCED_TIMEOUT_SECS {
            warn!(
                "forced_timeout_secs {} below minimum, using {MIN_FORCED_TIMEOUT_SECS}",
                self.forced_timeout_secs
            );
        }

        MonitorSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            probe_spacing: Duration::from_secs(self.probe_spacing_secs),
            probe_attempts: self.probe_attempts.max(1),
            recovery_damping: Duration::from_secs(self.recovery_damping_secs),
            removal_timeout: Duration::from_secs(self.removal_timeout_secs.max(MIN_REMOVAL_TIMEOUT_SECS)),
            forced_timeout: Duration::from_secs(self.forced_timeout_secs.max(MIN_FORCED_TIMEOUT_SECS)),
            notify_on_start: self.notify_on_start,
        }
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs.max(1))
    }
}

/// Read a configuration file; `.toml` files are parsed as TOML, anything else as JSON
pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path)?;

    let parsed: anyhow::Result<Config> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&file_content)
            .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}")),
        _ => serde_json::from_str(&file_content)
            .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}")),
    };

    parsed.inspect(|config| trace!("loaded config: {config:?}"))
}
