//! Per-host monitoring tasks
//!
//! Each registered host is watched by an independent async task. Tasks share
//! nothing but the [`crate::registry::Registry`], which they only touch to
//! remove their own entry.
//!
//! ## Architecture Overview
//!
//! ```text
//!     commands / passive detector
//!                 │ track()
//!        ┌────────▼────────┐
//!        │    Registry     │◄──────── bulk cancel / dump / exists
//!        └────────┬────────┘
//!                 │ spawns (after a successful add)
//!      ┌──────────┼──────────┐
//!      │          │          │
//! ┌────▼────┐┌────▼────┐┌────▼────┐
//! │Monitor-1││Monitor-2││Monitor-N│ ── Prober::check
//! └────┬────┘└────┬────┘└────┬────┘
//!      └──────────┼──────────┘
//!                 ▼
//!        Notifier::send(origin, text)
//! ```
//!
//! ## Cancellation
//!
//! Every host carries a `CancellationToken`. Removing the entry from the
//! registry cancels it; the monitor notices at its next wait point (poll
//! interval or sub-probe spacing) and exits.

pub mod host_monitor;
pub mod messages;
