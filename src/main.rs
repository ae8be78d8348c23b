//! Nudge - keeps a Windows workstation awake.
//!
//! The application runs silently with a system tray icon. When the user
//! has been idle past the configured threshold, and the weekly schedule
//! allows it, the cursor is nudged one pixel out and back.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(windows)]
fn main() {
    if let Err(e) = windows_main::run() {
        nudge::alert::show_error("Nudge", &format!("Nudge failed to start:\n\n{e}"));
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
fn main() {
    eprintln!("Nudge only supports Windows.");
    std::process::exit(1);
}

#[cfg(windows)]
mod windows_main {
    use nudge::autostart::RegistryAutostart;
    use nudge::config_ui::EditorConfigUi;
    use nudge::controller::{Controller, Intent, TrayUpdate};
    use nudge::settings::SettingsStore;
    use nudge::tray::Tray;
    use nudge::winapi_utils::{
        is_process_running, post_quit_message, pump_messages, register_main_thread,
    };
    use std::fs::{self, OpenOptions};
    use std::io::{Read, Write};
    use std::path::PathBuf;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    /// How long the UI loop sleeps between pump iterations.
    const UI_TICK: Duration = Duration::from_millis(50);

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let Some(_lock) = acquire_instance_lock()? else {
            // Another instance owns the tray; nothing to do.
            return Ok(());
        };

        run_application()
    }

    /// Takes the single-instance lock, validating any PID left behind by
    /// a previous run so a stale lock never blocks startup.
    fn acquire_instance_lock() -> Result<Option<LockFileGuard>, Box<dyn std::error::Error>> {
        let lock_path: PathBuf = match std::env::var("APPDATA") {
            Ok(appdata) => PathBuf::from(appdata).join("nudge").join("nudge.lock"),
            Err(_) => PathBuf::from(".").join("nudge.lock"),
        };

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if lock_path.exists() {
            if let Ok(mut file) = fs::File::open(&lock_path) {
                let mut pid_str = String::new();
                if file.read_to_string(&mut pid_str).is_ok() {
                    if let Ok(pid) = pid_str.trim().parse::<u32>() {
                        if is_process_running(pid) {
                            nudge::alert::show_warning(
                                "Nudge - Already Running",
                                "Nudge is already running.\n\nCheck the system tray for the icon.",
                            );
                            return Ok(None);
                        }
                    }
                }
            }
            // Stale lock file - remove it
            let _ = fs::remove_file(&lock_path);
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)?;
        write!(file, "{}", std::process::id())?;

        Ok(Some(LockFileGuard(lock_path)))
    }

    // RAII guard to delete lock file on exit
    struct LockFileGuard(PathBuf);

    impl Drop for LockFileGuard {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn run_application() -> Result<(), Box<dyn std::error::Error>> {
        // Initialize logging
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nudge=info")),
            )
            .init();

        let store = SettingsStore::new();
        let settings = store.load();
        tracing::info!(
            path = %store.path().display(),
            threshold_secs = settings.idle_threshold_seconds,
            "Settings loaded"
        );

        let (updates_tx, updates_rx) = mpsc::channel::<TrayUpdate>();
        let (intents_tx, intents_rx) = mpsc::channel::<Intent>();

        let controller = Controller::new(
            settings,
            store.clone(),
            Box::new(RegistryAutostart::new()?),
            Arc::new(EditorConfigUi::new(store)),
            updates_tx,
            intents_tx.clone(),
            intents_rx,
        );
        let controller_handle = thread::Builder::new()
            .name("controller".to_string())
            .spawn(move || controller.run())?;

        // The tray is the UI, but monitoring still works without it.
        let mut tray = match Tray::new() {
            Ok(tray) => Some(tray),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create system tray, continuing without it");
                None
            }
        };

        // Handle Ctrl+C as backup
        let shutdown_tx = intents_tx.clone();
        ctrlc::set_handler(move || {
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(Intent::ExitRequested);
            post_quit_message(0);
        })?;

        register_main_thread();
        tracing::info!("Nudge is running in the system tray");

        loop {
            if !pump_messages() {
                break;
            }

            if let Some(tray) = tray.as_ref() {
                tray.dispatch_menu_events(&intents_tx);
            }

            let mut quit = false;
            while let Ok(update) = updates_rx.try_recv() {
                if matches!(update, TrayUpdate::Quit) {
                    quit = true;
                }
                if let Some(tray) = tray.as_mut() {
                    tray.apply(update);
                }
            }
            if quit {
                break;
            }

            thread::sleep(UI_TICK);
        }

        // The controller may already be gone if it initiated the quit.
        let _ = intents_tx.send(Intent::ExitRequested);
        if controller_handle.join().is_err() {
            tracing::error!("Controller thread panicked");
        }

        tracing::info!("Nudge has exited");
        Ok(())
    }
}
