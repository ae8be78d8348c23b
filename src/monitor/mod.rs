//! Idle monitoring.
//!
//! Polls the system-wide last-input timestamp on a dedicated thread and
//! raises an idle event whenever the elapsed time reaches the configured
//! threshold.

pub mod idle_poller;

pub use idle_poller::*;
