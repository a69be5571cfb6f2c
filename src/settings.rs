use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::SettingsError;
use crate::state::PlaybackMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub display_interval_seconds: f32,
    pub info_button_code: u16,
    pub mode_button_code: u16,
    pub active_mode: PlaybackMode,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            display_interval_seconds: DEFAULT_INTERVAL_SECS,
            info_button_code: DEFAULT_INFO_BUTTON,
            mode_button_code: DEFAULT_MODE_BUTTON,
            active_mode: PlaybackMode::Photos,
            muted: false,
        }
    }
}

impl Settings {
    /// Shortens (`faster`) or lengthens the display interval by one step,
    /// clamped. Returns whether the value changed.
    pub fn step_interval(&mut self, faster: bool) -> bool {
        let delta = if faster { -INTERVAL_STEP_SECS } else { INTERVAL_STEP_SECS };
        let stepped = (self.display_interval_seconds + delta).clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS);
        let changed = stepped != self.display_interval_seconds;
        self.display_interval_seconds = stepped;
        changed
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f32(
            self.display_interval_seconds.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS),
        )
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Reads the blob, falling back to defaults on any failure.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => {
                info!("Settings loaded from {}: {:?}", self.path.display(), settings);
                settings
            }
            Err(e) => {
                warn!("Using default settings: {}", e);
                Settings::default()
            }
        }
    }

    fn try_load(&self) -> Result<Settings, SettingsError> {
        let bytes = fs::read(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // Sibling temp file, then rename.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let json = serde_json::to_vec_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!("Settings saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn garbage_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(SettingsStore::new(&path).load(), Settings::default());
    }

    #[test]
    fn out_of_range_mode_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, br#"{"active_mode": 7}"#).unwrap();
        assert_eq!(SettingsStore::new(&path).load(), Settings::default());
    }

    #[test]
    fn missing_keys_take_individual_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, br#"{"active_mode": 3, "muted": true}"#).unwrap();

        let settings = SettingsStore::new(&path).load();
        assert_eq!(settings.active_mode, PlaybackMode::GameVideos);
        assert!(settings.muted);
        assert_eq!(settings.display_interval_seconds, DEFAULT_INTERVAL_SECS);
        assert_eq!(settings.info_button_code, DEFAULT_INFO_BUTTON);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let settings = Settings {
            display_interval_seconds: 8.0,
            info_button_code: 310,
            mode_button_code: 311,
            active_mode: PlaybackMode::AutoCycle,
            muted: true,
        };
        store.save(&settings).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"active_mode\": 4"));
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_into_missing_directory_fails_without_panicking() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nope").join("settings.json"));
        assert!(store.save(&Settings::default()).is_err());
    }

    #[test]
    fn interval_steps_are_clamped() {
        let mut settings = Settings {
            display_interval_seconds: MIN_INTERVAL_SECS,
            ..Settings::default()
        };
        assert!(!settings.step_interval(true));
        assert_eq!(settings.display_interval_seconds, MIN_INTERVAL_SECS);
        assert!(settings.step_interval(false));
        assert_eq!(settings.display_interval_seconds, MIN_INTERVAL_SECS + INTERVAL_STEP_SECS);

        settings.display_interval_seconds = MAX_INTERVAL_SECS;
        assert!(!settings.step_interval(false));
    }
}
