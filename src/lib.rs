//! Host live/dead monitoring
//!
//! Hosts are registered by key in a [`registry::Registry`]; each one gets a
//! monitor task that probes it periodically, reports online/offline
//! transitions through a [`notify::Notifier`] and evicts itself once the host
//! has been healthy long enough or a hard lifetime cap is hit.

pub mod actors;
pub mod api;
pub mod commands;
pub mod config;
pub mod detect;
pub mod error;
pub mod notify;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod settings;
pub mod tracker;
pub mod util;
