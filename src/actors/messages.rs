//! Status messages emitted by host monitors
//!
//! All texts are plain; formatting for a specific chat platform is left to
//! the notifier.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use crate::util::format_duration;

/// A human readable status update about a single host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    /// First probe succeeded (only sent with notify-on-start)
    Online(IpAddr),

    /// First probe failed (only sent with notify-on-start)
    Offline(IpAddr),

    /// Host recovered after being unreachable
    NowOnline { address: IpAddr, downtime: Duration },

    /// Host stopped answering
    NowOffline(IpAddr),

    /// Registration outlived the forced monitoring cap
    ForcedTimeout { address: IpAddr, limit: Duration },

    /// Host stayed healthy for longer than the removal timeout
    RemovalTimeout { address: IpAddr, limit: Duration },

    /// The last watcher of a passive entry left
    NoLongerMonitoring(IpAddr),
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::Online(address) => write!(f, "{address} online"),
            StatusMessage::Offline(address) => write!(f, "{address} offline"),
            StatusMessage::NowOnline { address, downtime } => write!(
                f,
                "{address} now online (downtime: {})",
                format_duration(*downtime)
            ),
            StatusMessage::NowOffline(address) => write!(f, "{address} now offline"),
            StatusMessage::ForcedTimeout { address, limit } => write!(
                f,
                "stopped monitoring {address}: checks exceeded forced monitoring duration of {}",
                format_duration(*limit)
            ),
            StatusMessage::RemovalTimeout { address, limit } => write!(
                f,
                "stopped monitoring {address}: time since last offline exceeds {}",
                format_duration(*limit)
            ),
            StatusMessage::NoLongerMonitoring(address) => {
                write!(f, "no longer monitoring: {address}")
            }
        }
    }
}
