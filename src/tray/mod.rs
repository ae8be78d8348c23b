//! System tray UI.
//!
//! Owns the tray icon and menu on the main thread. State arrives as
//! [`TrayUpdate`] events from the controller; user clicks leave as
//! [`Intent`] events. Nothing here is shared across threads.

pub mod icon;
pub mod menu;

pub use icon::*;
pub use menu::*;

use crate::controller::{Intent, TrayUpdate};
use std::sync::mpsc::Sender;
use tray_icon::menu::MenuEvent;
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

const TOOLTIP: &str = "Nudge - Keep Awake";

/// The tray icon, its menu, and the bit of display state needed to pick
/// the right icon variant.
pub struct Tray {
    tray: TrayIcon,
    menu: TrayMenu,
    icon_normal: Icon,
    icon_active: Icon,
    icon_disabled: Icon,
    active: bool,
    monitoring: bool,
}

impl Tray {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let icon_normal = create_state_icon(COLOR_NORMAL)?;
        let icon_active = create_state_icon(COLOR_ACTIVE)?;
        let icon_disabled = create_state_icon(COLOR_DISABLED)?;

        let menu = TrayMenu::new();
        let tray = TrayIconBuilder::new()
            .with_tooltip(TOOLTIP)
            .with_icon(icon_normal.clone())
            .with_menu(Box::new(menu.menu.clone()))
            .build()?;

        tracing::info!("System tray initialized");

        Ok(Self {
            tray,
            menu,
            icon_normal,
            icon_active,
            icon_disabled,
            active: false,
            monitoring: true,
        })
    }

    /// Applies a state change pushed by the controller.
    pub fn apply(&mut self, update: TrayUpdate) {
        match update {
            TrayUpdate::Active(active) => {
                self.active = active;
                self.refresh_icon();
            }
            TrayUpdate::Monitoring(enabled) => {
                self.monitoring = enabled;
                self.menu.set_monitoring(enabled);
                self.refresh_icon();
            }
            TrayUpdate::ScheduleStatus { label, .. } => {
                self.menu.set_schedule_label(&label);
            }
            TrayUpdate::Threshold(seconds) => {
                self.menu.set_threshold(seconds);
            }
            TrayUpdate::Autostart(enabled) => {
                self.menu.set_autostart(enabled);
            }
            TrayUpdate::Quit => {}
        }
    }

    /// Drains pending menu clicks, translating them into intents.
    pub fn dispatch_menu_events(&self, intents: &Sender<Intent>) {
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            match event.id.0.as_str() {
                MENU_ID_START_STOP => {
                    let _ = intents.send(Intent::StartStopRequested(!self.monitoring));
                }
                MENU_ID_CONFIGURE => {
                    let _ = intents.send(Intent::ConfigureRequested);
                }
                MENU_ID_EXIT => {
                    tracing::info!("Exit requested from tray menu");
                    let _ = intents.send(Intent::ExitRequested);
                }
                other => {
                    tracing::debug!(menu_id = other, "Unknown menu event");
                }
            }
        }
    }

    fn refresh_icon(&mut self) {
        let icon = if !self.monitoring {
            self.icon_disabled.clone()
        } else if self.active {
            self.icon_active.clone()
        } else {
            self.icon_normal.clone()
        };

        if let Err(e) = self.tray.set_icon(Some(icon)) {
            tracing::warn!(error = %e, "Failed to update tray icon");
        }
    }
}
