//! Context menu for the system tray.

use tray_icon::menu::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem};

/// Menu item IDs
pub const MENU_ID_START_STOP: &str = "start_stop";
pub const MENU_ID_CONFIGURE: &str = "configure";
pub const MENU_ID_EXIT: &str = "exit";

/// The tray context menu with handles to its mutable items.
pub struct TrayMenu {
    pub menu: Menu,
    start_stop: MenuItem,
    threshold: MenuItem,
    schedule: MenuItem,
    autostart: CheckMenuItem,
}

impl TrayMenu {
    pub fn new() -> Self {
        let menu = Menu::new();

        let start_stop = MenuItem::with_id(
            MenuId::new(MENU_ID_START_STOP),
            "Stop Monitoring",
            true,
            None,
        );

        // Status rows: visible but not clickable.
        let threshold = MenuItem::new("Idle threshold: 300s", false, None);
        let schedule = MenuItem::new("Schedule: -", false, None);
        let autostart = CheckMenuItem::new("Start with Windows", false, false, None);

        let configure = MenuItem::with_id(MenuId::new(MENU_ID_CONFIGURE), "Configure...", true, None);
        let exit = MenuItem::with_id(MenuId::new(MENU_ID_EXIT), "Exit", true, None);

        let _ = menu.append(&start_stop);
        let _ = menu.append(&PredefinedMenuItem::separator());
        let _ = menu.append(&threshold);
        let _ = menu.append(&schedule);
        let _ = menu.append(&autostart);
        let _ = menu.append(&PredefinedMenuItem::separator());
        let _ = menu.append(&configure);
        let _ = menu.append(&exit);

        Self {
            menu,
            start_stop,
            threshold,
            schedule,
            autostart,
        }
    }

    pub fn set_monitoring(&self, enabled: bool) {
        let text = if enabled {
            "Stop Monitoring"
        } else {
            "Start Monitoring"
        };
        self.start_stop.set_text(text);
    }

    pub fn set_threshold(&self, seconds: u32) {
        self.threshold.set_text(format!("Idle threshold: {seconds}s"));
    }

    pub fn set_schedule_label(&self, label: &str) {
        self.schedule.set_text(label);
    }

    pub fn set_autostart(&self, enabled: bool) {
        self.autostart.set_checked(enabled);
    }
}

impl Default for TrayMenu {
    fn default() -> Self {
        Self::new()
    }
}
