//! Application settings and their persistence.
//!
//! Settings are stored as JSON in `nudge_settings.json` next to the
//! executable so the whole installation stays portable. Loading is
//! forgiving: a missing or corrupt file yields defaults with a logged
//! warning, and unknown or missing fields fall back per-field.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the settings store, placed beside the binary.
pub const SETTINGS_FILENAME: &str = "nudge_settings.json";

/// Day names addressed by index (0 = Monday .. 6 = Sunday).
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("idle threshold must be a positive number of seconds")]
    InvalidThreshold,

    #[error("invalid time '{value}' for {day}: expected zero-padded HH:MM")]
    InvalidTime { day: &'static str, value: String },
}

/// Active window for a single day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Start of the active window, 24-hour "HH:MM".
    #[serde(default = "default_start_time")]
    pub start_time: String,

    /// End of the active window, 24-hour "HH:MM".
    #[serde(default = "default_stop_time")]
    pub stop_time: String,
}

fn default_enabled() -> bool {
    true
}

fn default_start_time() -> String {
    "08:00".to_string()
}

fn default_stop_time() -> String {
    "17:00".to_string()
}

impl Default for DaySchedule {
    fn default() -> Self {
        Self {
            enabled: true,
            start_time: default_start_time(),
            stop_time: default_stop_time(),
        }
    }
}

impl DaySchedule {
    /// A day with the default window but marked inactive.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Weekly schedule, one [`DaySchedule`] per weekday.
///
/// Defaults to Monday-Friday 08:00-17:00 with the weekend disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    #[serde(default)]
    pub monday: DaySchedule,
    #[serde(default)]
    pub tuesday: DaySchedule,
    #[serde(default)]
    pub wednesday: DaySchedule,
    #[serde(default)]
    pub thursday: DaySchedule,
    #[serde(default)]
    pub friday: DaySchedule,
    #[serde(default = "DaySchedule::disabled")]
    pub saturday: DaySchedule,
    #[serde(default = "DaySchedule::disabled")]
    pub sunday: DaySchedule,
}

impl Default for WeeklySchedule {
    fn default() -> Self {
        Self {
            monday: DaySchedule::default(),
            tuesday: DaySchedule::default(),
            wednesday: DaySchedule::default(),
            thursday: DaySchedule::default(),
            friday: DaySchedule::default(),
            saturday: DaySchedule::disabled(),
            sunday: DaySchedule::disabled(),
        }
    }
}

impl WeeklySchedule {
    /// Returns the schedule for a day by index (0 = Monday .. 6 = Sunday).
    pub fn day(&self, index: usize) -> Option<&DaySchedule> {
        self.days().into_iter().nth(index)
    }

    /// All seven days in Monday-first order.
    pub fn days(&self) -> [&DaySchedule; 7] {
        [
            &self.monday,
            &self.tuesday,
            &self.wednesday,
            &self.thursday,
            &self.friday,
            &self.saturday,
            &self.sunday,
        ]
    }
}

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds of inactivity before a nudge is triggered.
    #[serde(default = "default_threshold")]
    pub idle_threshold_seconds: u32,

    /// Whether the app is registered to start with Windows.
    #[serde(default)]
    pub auto_start: bool,

    /// Master switch for idle monitoring.
    #[serde(default = "default_enabled")]
    pub monitoring_enabled: bool,

    #[serde(default)]
    pub schedule: WeeklySchedule,
}

fn default_threshold() -> u32 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            idle_threshold_seconds: default_threshold(),
            auto_start: false,
            monitoring_enabled: true,
            schedule: WeeklySchedule::default(),
        }
    }
}

/// Validates settings the way the configuration boundary must before
/// handing them to the control loop: a positive threshold and strictly
/// zero-padded two-digit HH:MM times on every day.
pub fn validate(settings: &Settings) -> Result<(), SettingsError> {
    if settings.idle_threshold_seconds == 0 {
        return Err(SettingsError::InvalidThreshold);
    }

    for (name, day) in DAY_NAMES.iter().zip(settings.schedule.days()) {
        for value in [&day.start_time, &day.stop_time] {
            if !is_valid_time_string(value) {
                return Err(SettingsError::InvalidTime {
                    day: name,
                    value: value.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Strict "HH:MM" check: exactly five characters, two-digit zero-padded
/// hour 00-23 and minute 00-59.
pub fn is_valid_time_string(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    if ![bytes[0], bytes[1], bytes[3], bytes[4]]
        .iter()
        .all(u8::is_ascii_digit)
    {
        return false;
    }

    let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    let minute = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
    hour <= 23 && minute <= 59
}

/// Loads and saves [`Settings`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store located beside the running executable.
    pub fn new() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            path: dir.join(SETTINGS_FILENAME),
        }
    }

    /// Store at an explicit path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads settings, falling back to defaults if the file is missing or
    /// unreadable. Never fails.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No settings file, using defaults");
            return Settings::default();
        }

        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not load settings, using defaults"
                );
                Settings::default()
            }
        }
    }

    /// Loads settings, surfacing read and parse errors to the caller.
    pub fn try_load(&self) -> Result<Settings, SettingsError> {
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Saves settings. Best-effort: returns `false` and logs on failure.
    pub fn save(&self, settings: &Settings) -> bool {
        let write = || -> Result<(), SettingsError> {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let json = serde_json::to_string_pretty(settings)?;
            std::fs::write(&self.path, json)?;
            Ok(())
        };

        match write() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to save settings"
                );
                false
            }
        }
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_weekend_disabled() {
        let schedule = WeeklySchedule::default();
        assert!(schedule.monday.enabled);
        assert!(schedule.friday.enabled);
        assert!(!schedule.saturday.enabled);
        assert!(!schedule.sunday.enabled);
        assert_eq!(schedule.monday.start_time, "08:00");
        assert_eq!(schedule.monday.stop_time, "17:00");
    }

    #[test]
    fn test_day_lookup_by_index() {
        let schedule = WeeklySchedule::default();
        assert!(schedule.day(0).is_some_and(|d| d.enabled));
        assert!(schedule.day(6).is_some_and(|d| !d.enabled));
        assert!(schedule.day(7).is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::with_path(dir.path().join(SETTINGS_FILENAME));

        let mut settings = Settings::default();
        settings.idle_threshold_seconds = 120;
        settings.auto_start = true;
        settings.schedule.wednesday.enabled = false;

        assert!(store.save(&settings));
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::with_path(dir.path().join("does_not_exist.json"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_load_corrupt_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        std::fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::with_path(path);
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_try_load_surfaces_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let store = SettingsStore::with_path(path);
        assert!(matches!(store.try_load(), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        std::fs::write(&path, r#"{"idle_threshold_seconds": 60}"#).unwrap();

        let store = SettingsStore::with_path(path);
        let settings = store.load();
        assert_eq!(settings.idle_threshold_seconds, 60);
        assert!(settings.monitoring_enabled);
        assert!(!settings.schedule.sunday.enabled);
    }

    #[test]
    fn test_time_string_validation() {
        assert!(is_valid_time_string("00:00"));
        assert!(is_valid_time_string("08:30"));
        assert!(is_valid_time_string("23:59"));

        assert!(!is_valid_time_string("24:00"));
        assert!(!is_valid_time_string("12:60"));
        assert!(!is_valid_time_string("8:00"));
        assert!(!is_valid_time_string("08:0"));
        assert!(!is_valid_time_string("0800"));
        assert!(!is_valid_time_string("ab:cd"));
        assert!(!is_valid_time_string(""));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let mut settings = Settings::default();
        settings.idle_threshold_seconds = 0;
        assert!(matches!(
            validate(&settings),
            Err(SettingsError::InvalidThreshold)
        ));
    }

    #[test]
    fn test_validate_rejects_malformed_time() {
        let mut settings = Settings::default();
        settings.schedule.tuesday.stop_time = "17:5".to_string();
        let err = validate(&settings).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidTime { day: "Tuesday", .. }
        ));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(validate(&Settings::default()).is_ok());
    }
}
