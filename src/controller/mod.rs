//! The control loop.
//!
//! The controller runs on its own thread and is the single owner of the
//! settings, the idle monitor, and the schedule. Background workers and
//! the tray feed it [`Intent`] events over a channel; it answers with
//! [`TrayUpdate`] events instead of touching UI objects across threads.

pub mod responder;

pub use responder::{IdleResponder, MonitorGate};

use crate::alert;
use crate::autostart::AutostartRegistrar;
use crate::config_ui::ConfigUi;
use crate::monitor::{IdleHandler, IdleMonitor};
use crate::schedule;
use crate::settings::{Settings, SettingsStore};
use crate::timer::PeriodicTimer;
use chrono::{Datelike, Local, NaiveDateTime};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Cadence of schedule re-evaluation.
const SCHEDULE_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// How long the tray icon keeps its "active" tint after a nudge.
const ICON_RESET_DELAY: Duration = Duration::from_millis(1500);

/// Events consumed by the controller.
#[derive(Debug)]
pub enum Intent {
    /// User asked to start (`true`) or stop monitoring from the tray.
    StartStopRequested(bool),
    /// User opened the configuration surface.
    ConfigureRequested,
    /// The configuration surface closed; `None` means cancelled.
    ConfigurationClosed(Option<Settings>),
    /// Periodic schedule re-evaluation.
    ScheduleTick,
    /// User or signal handler asked the app to exit.
    ExitRequested,
}

/// State changes pushed to the tray/UI layer.
#[derive(Debug)]
pub enum TrayUpdate {
    /// A nudge is (still) being shown as active.
    Active(bool),
    Monitoring(bool),
    ScheduleStatus { within: bool, label: String },
    Threshold(u32),
    Autostart(bool),
    /// The controller has shut down; the UI loop should end.
    Quit,
}

/// Coordinates idle monitoring, schedule evaluation, actuation, and
/// configuration.
pub struct Controller {
    settings: Settings,
    store: SettingsStore,
    autostart: Box<dyn AutostartRegistrar>,
    config_ui: Arc<dyn ConfigUi>,
    gate: Arc<Mutex<MonitorGate>>,
    responder: Arc<IdleResponder>,
    monitor: IdleMonitor,
    updates: Sender<TrayUpdate>,
    intents_tx: Sender<Intent>,
    intents_rx: Receiver<Intent>,
    ticker: Option<PeriodicTimer>,
    config_in_flight: bool,
}

impl Controller {
    pub fn new(
        settings: Settings,
        store: SettingsStore,
        autostart: Box<dyn AutostartRegistrar>,
        config_ui: Arc<dyn ConfigUi>,
        updates: Sender<TrayUpdate>,
        intents_tx: Sender<Intent>,
        intents_rx: Receiver<Intent>,
    ) -> Self {
        let gate = Arc::new(Mutex::new(MonitorGate {
            monitoring_enabled: settings.monitoring_enabled,
            within_schedule: false,
            is_moving: false,
        }));
        let responder = Arc::new(IdleResponder::new(
            Arc::clone(&gate),
            updates.clone(),
            ICON_RESET_DELAY,
        ));
        let monitor = IdleMonitor::new(
            settings.idle_threshold_seconds,
            Arc::clone(&responder) as Arc<dyn IdleHandler>,
        );

        Self {
            settings,
            store,
            autostart,
            config_ui,
            gate,
            responder,
            monitor,
            updates,
            intents_tx,
            intents_rx,
            ticker: None,
            config_in_flight: false,
        }
    }

    /// Runs the control loop until an exit intent arrives or every intent
    /// sender is gone.
    pub fn run(mut self) {
        self.startup();

        while let Ok(intent) = self.intents_rx.recv() {
            match intent {
                Intent::StartStopRequested(enabled) => self.set_monitoring_enabled(enabled),
                Intent::ConfigureRequested => self.begin_configuration(),
                Intent::ConfigurationClosed(result) => self.finish_configuration(result),
                Intent::ScheduleTick => self.update_schedule_state(),
                Intent::ExitRequested => {
                    self.shutdown();
                    return;
                }
            }
        }

        tracing::warn!("Intent channel closed without an exit request");
        self.shutdown();
    }

    fn startup(&mut self) {
        // The registry is the source of truth for autostart; reconcile
        // a settings file that disagrees with it.
        let registered = self.autostart.is_enabled();
        if self.settings.auto_start != registered {
            self.settings.auto_start = registered;
            if !self.store.save(&self.settings) {
                alert::show_warning(
                    "Nudge",
                    "Failed to save the auto-start setting. Changes may not persist.",
                );
            }
        }

        self.send(TrayUpdate::Autostart(registered));
        self.send(TrayUpdate::Threshold(self.settings.idle_threshold_seconds));
        self.send(TrayUpdate::Monitoring(self.settings.monitoring_enabled));
        self.update_schedule_state();

        let tx = self.intents_tx.clone();
        self.ticker = Some(PeriodicTimer::spawn(
            "schedule-ticker",
            SCHEDULE_REFRESH_INTERVAL,
            move || {
                let _ = tx.send(Intent::ScheduleTick);
            },
        ));

        tracing::info!(
            threshold_secs = self.settings.idle_threshold_seconds,
            monitoring = self.settings.monitoring_enabled,
            "Controller started"
        );
    }

    fn shutdown(&mut self) {
        tracing::info!("Controller shutting down");
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.monitor.stop();
        self.responder.cancel_icon_decay();
        self.send(TrayUpdate::Quit);
    }

    fn set_monitoring_enabled(&mut self, enabled: bool) {
        self.settings.monitoring_enabled = enabled;
        if !self.store.save(&self.settings) {
            alert::show_warning(
                "Nudge",
                "Failed to save the monitoring setting. Changes may not persist.",
            );
        }
        if !enabled {
            self.responder.cancel_icon_decay();
            self.send(TrayUpdate::Active(false));
        }
        self.send(TrayUpdate::Monitoring(enabled));
        self.update_schedule_state();
    }

    /// Re-evaluates the schedule and starts or stops the idle poller to
    /// match. This is the only place the poller is started.
    fn update_schedule_state(&mut self) {
        let now = Local::now().naive_local();
        let within = schedule::is_within_schedule(&self.settings.schedule, now);
        let label = self.schedule_label(now, within);
        self.send(TrayUpdate::ScheduleStatus { within, label });
        self.apply_monitoring_state(within);
    }

    fn apply_monitoring_state(&mut self, within_schedule: bool) {
        if let Ok(mut gate) = self.gate.lock() {
            gate.monitoring_enabled = self.settings.monitoring_enabled;
            gate.within_schedule = within_schedule;
        }

        if self.settings.monitoring_enabled && within_schedule {
            self.monitor.start();
        } else {
            self.monitor.stop();
        }
    }

    fn schedule_label(&self, now: NaiveDateTime, within: bool) -> String {
        let day_index = now.weekday().num_days_from_monday() as usize;
        let name = schedule::day_name(day_index).unwrap_or("Unknown");

        let mut label = match self.settings.schedule.day(day_index) {
            Some(day) if day.enabled => {
                format!("Schedule: {} {}-{}", name, day.start_time, day.stop_time)
            }
            _ => format!("Schedule: {} disabled", name),
        };

        if !within {
            if let Some(next) = schedule::next_active_instant(&self.settings.schedule, now) {
                let next_day = schedule::day_name(next.weekday().num_days_from_monday() as usize)
                    .unwrap_or("Unknown");
                label.push_str(&format!(" (next {} {})", next_day, next.format("%H:%M")));
            }
        }

        label
    }

    fn begin_configuration(&mut self) {
        if self.config_in_flight {
            tracing::debug!("Configuration surface already open");
            return;
        }

        let mut snapshot = self.settings.clone();
        snapshot.auto_start = self.autostart.is_enabled();

        let ui = Arc::clone(&self.config_ui);
        let tx = self.intents_tx.clone();
        let spawned = thread::Builder::new()
            .name("config-ui".to_string())
            .spawn(move || {
                let outcome = ui.present(&snapshot);
                let _ = tx.send(Intent::ConfigurationClosed(outcome));
            });

        match spawned {
            Ok(_) => self.config_in_flight = true,
            Err(e) => tracing::error!(error = %e, "Failed to open configuration surface"),
        }
    }

    fn finish_configuration(&mut self, result: Option<Settings>) {
        self.config_in_flight = false;
        let Some(updated) = result else {
            tracing::debug!("Configuration cancelled");
            return;
        };
        self.apply_settings(updated);
    }

    /// Applies a full settings replacement: autostart registration first
    /// (reverting the toggle if the OS call fails), then the idle
    /// threshold and schedule, then persistence and a re-derived
    /// monitoring state.
    fn apply_settings(&mut self, mut updated: Settings) {
        let current_autostart = self.autostart.is_enabled();
        if updated.auto_start != current_autostart {
            if !self.autostart.set_enabled(updated.auto_start) {
                alert::show_warning(
                    "Nudge",
                    "Failed to update the auto-start registration. Please try again.",
                );
                updated.auto_start = current_autostart;
            }
        }

        // The configuration surface does not own the master switch.
        updated.monitoring_enabled = self.settings.monitoring_enabled;

        if let Err(e) = self.monitor.set_threshold(updated.idle_threshold_seconds) {
            tracing::warn!(error = %e, "Rejected idle threshold from configuration");
            updated.idle_threshold_seconds = self.settings.idle_threshold_seconds;
        }

        self.settings = updated;
        if !self.store.save(&self.settings) {
            alert::show_warning("Nudge", "Failed to save configuration. Changes may not persist.");
        }

        self.send(TrayUpdate::Threshold(self.settings.idle_threshold_seconds));
        self.send(TrayUpdate::Autostart(self.settings.auto_start));
        self.send(TrayUpdate::Monitoring(self.settings.monitoring_enabled));
        self.update_schedule_state();
    }

    fn send(&self, update: TrayUpdate) {
        let _ = self.updates.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DaySchedule, WeeklySchedule, SETTINGS_FILENAME};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;

    struct MockAutostart {
        enabled: AtomicBool,
        fail: bool,
    }

    impl MockAutostart {
        fn new(enabled: bool, fail: bool) -> Box<Self> {
            Box::new(Self {
                enabled: AtomicBool::new(enabled),
                fail,
            })
        }
    }

    impl AutostartRegistrar for MockAutostart {
        fn is_enabled(&self) -> bool {
            self.enabled.load(Ordering::SeqCst)
        }

        fn set_enabled(&self, enabled: bool) -> bool {
            if self.fail {
                return false;
            }
            self.enabled.store(enabled, Ordering::SeqCst);
            true
        }
    }

    struct NullConfigUi;

    impl ConfigUi for NullConfigUi {
        fn present(&self, _current: &Settings) -> Option<Settings> {
            None
        }
    }

    fn all_day() -> WeeklySchedule {
        let day = DaySchedule {
            enabled: true,
            start_time: "00:00".to_string(),
            stop_time: "23:59".to_string(),
        };
        WeeklySchedule {
            monday: day.clone(),
            tuesday: day.clone(),
            wednesday: day.clone(),
            thursday: day.clone(),
            friday: day.clone(),
            saturday: day.clone(),
            sunday: day,
        }
    }

    fn no_days() -> WeeklySchedule {
        let mut schedule = all_day();
        schedule.monday.enabled = false;
        schedule.tuesday.enabled = false;
        schedule.wednesday.enabled = false;
        schedule.thursday.enabled = false;
        schedule.friday.enabled = false;
        schedule.saturday.enabled = false;
        schedule.sunday.enabled = false;
        schedule
    }

    struct Harness {
        controller: Controller,
        updates_rx: mpsc::Receiver<TrayUpdate>,
        _dir: tempfile::TempDir,
    }

    fn harness(settings: Settings, autostart: Box<dyn AutostartRegistrar>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::with_path(dir.path().join(SETTINGS_FILENAME));
        let (updates_tx, updates_rx) = mpsc::channel();
        let (intents_tx, intents_rx) = mpsc::channel();

        let controller = Controller::new(
            settings,
            store,
            autostart,
            Arc::new(NullConfigUi),
            updates_tx,
            intents_tx,
            intents_rx,
        );

        Harness {
            controller,
            updates_rx,
            _dir: dir,
        }
    }

    #[test]
    fn test_enable_outside_schedule_does_not_start_poller() {
        let mut settings = Settings::default();
        settings.monitoring_enabled = false;
        settings.schedule = no_days();

        let mut h = harness(settings, MockAutostart::new(false, false));
        h.controller.set_monitoring_enabled(true);

        assert!(!h.controller.monitor.is_running());

        // The window opens; the next tick starts the poller exactly once.
        h.controller.settings.schedule = all_day();
        h.controller.update_schedule_state();
        assert!(h.controller.monitor.is_running());

        h.controller.update_schedule_state();
        assert!(h.controller.monitor.is_running());

        h.controller.shutdown();
        assert!(!h.controller.monitor.is_running());
    }

    #[test]
    fn test_disable_stops_poller() {
        let mut settings = Settings::default();
        settings.schedule = all_day();

        let mut h = harness(settings, MockAutostart::new(false, false));
        h.controller.update_schedule_state();
        assert!(h.controller.monitor.is_running());

        h.controller.set_monitoring_enabled(false);
        assert!(!h.controller.monitor.is_running());
        h.controller.shutdown();
    }

    #[test]
    fn test_reconfiguration_is_idempotent() {
        let mut settings = Settings::default();
        settings.schedule = all_day();
        settings.idle_threshold_seconds = 90;

        let mut h = harness(settings.clone(), MockAutostart::new(false, false));
        h.controller.update_schedule_state();

        h.controller.apply_settings(settings.clone());
        h.controller.apply_settings(settings.clone());

        assert_eq!(h.controller.monitor.threshold_secs(), 90);
        assert!(h.controller.monitor.is_running());
        assert_eq!(h.controller.settings, {
            let mut expected = settings;
            expected.monitoring_enabled = true;
            expected
        });
        h.controller.shutdown();
    }

    #[test]
    fn test_threshold_applies_to_monitor() {
        let mut h = harness(Settings::default(), MockAutostart::new(false, false));

        let mut updated = h.controller.settings.clone();
        updated.idle_threshold_seconds = 42;
        h.controller.apply_settings(updated);

        assert_eq!(h.controller.monitor.threshold_secs(), 42);
        assert_eq!(h.controller.settings.idle_threshold_seconds, 42);
        h.controller.shutdown();
    }

    #[test]
    fn test_autostart_failure_reverts_toggle() {
        let mut h = harness(Settings::default(), MockAutostart::new(false, true));

        let mut updated = h.controller.settings.clone();
        updated.auto_start = true;
        h.controller.apply_settings(updated);

        assert!(!h.controller.settings.auto_start);
        assert!(!h.controller.store.load().auto_start);

        let autostart_updates: Vec<bool> = h
            .updates_rx
            .try_iter()
            .filter_map(|u| match u {
                TrayUpdate::Autostart(v) => Some(v),
                _ => None,
            })
            .collect();
        assert_eq!(autostart_updates, vec![false]);
        h.controller.shutdown();
    }

    #[test]
    fn test_startup_reconciles_autostart_with_registry() {
        let mut settings = Settings::default();
        settings.auto_start = true;
        settings.schedule = no_days();

        let mut h = harness(settings, MockAutostart::new(false, false));
        h.controller.startup();

        assert!(!h.controller.settings.auto_start);
        assert!(h
            .updates_rx
            .try_iter()
            .any(|u| matches!(u, TrayUpdate::Autostart(false))));
        h.controller.shutdown();
    }

    #[test]
    fn test_monitoring_toggle_is_persisted() {
        let mut settings = Settings::default();
        settings.schedule = no_days();

        let mut h = harness(settings, MockAutostart::new(false, false));
        h.controller.set_monitoring_enabled(false);

        assert!(!h.controller.store.load().monitoring_enabled);
        h.controller.shutdown();
    }

    #[test]
    fn test_exit_intent_ends_run_loop() {
        let mut settings = Settings::default();
        settings.schedule = no_days();

        let h = harness(settings, MockAutostart::new(false, false));
        let updates_rx = h.updates_rx;
        let intents_tx = h.controller.intents_tx.clone();

        let runner = thread::spawn(move || h.controller.run());
        intents_tx.send(Intent::ExitRequested).unwrap();
        runner.join().unwrap();

        let saw_quit = updates_rx.try_iter().any(|u| matches!(u, TrayUpdate::Quit));
        assert!(saw_quit);
    }

    #[test]
    fn test_schedule_label_mentions_next_activation_when_outside() {
        let mut settings = Settings::default();
        settings.schedule = no_days();
        settings.schedule.monday = DaySchedule::default();

        let h = harness(settings, MockAutostart::new(false, false));
        let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 6)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        let label = h.controller.schedule_label(now, false);
        assert!(label.starts_with("Schedule: Saturday disabled"));
        assert!(label.contains("next Monday 08:00"));
    }
}
