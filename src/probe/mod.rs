//! Reachability probes
//!
//! A [`Prober`] answers a single question: does this address respond right
//! now? Errors and timeouts are folded into `false`; host monitors treat an
//! unreachable answer as data, never as a failure of their own.

pub mod ping;

use std::net::IpAddr;

use async_trait::async_trait;

pub use ping::PingProber;

#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `address` once
    async fn check(&self, address: IpAddr) -> bool;
}
