//! Nudge - keeps a workstation awake with imperceptible mouse movements.
//!
//! The crate is split into a portable core (settings, schedule evaluation,
//! idle monitoring, the control loop) and thin Windows-only layers for the
//! system tray, autostart registration, and Win32 plumbing.

pub mod alert;
pub mod autostart;
pub mod config_ui;
pub mod controller;
pub mod monitor;
pub mod mouse;
pub mod platform;
pub mod schedule;
pub mod settings;
pub mod timer;

#[cfg(windows)]
pub mod tray;

#[cfg(windows)]
pub mod winapi_utils;
