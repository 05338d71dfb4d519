//! Settings persistence for the Pomodoro tab timer.
//!
//! The daemon loads the session durations, the mute preference and the
//! selected tab once at startup and writes them back whenever they change.
//! The file is plain JSON:
//!
//! ```json
//! {
//!   "sessions": { "work": 1500, "shortBreak": 300, "longBreak": 900 },
//!   "muted": false,
//!   "activeKind": "work"
//! }
//! ```
//!
//! A missing or unreadable file is never fatal; the daemon falls back to the
//! defaults.

mod error;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{SessionKind, SessionRegistry};

pub use error::SettingsError;

/// Application directory under the user's home
pub const APP_DIR: &str = ".pomotab";

/// Settings file name inside [`APP_DIR`]
pub const SETTINGS_FILE: &str = "settings.json";

// ============================================================================
// Settings
// ============================================================================

/// Persisted user settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Session durations in seconds
    pub sessions: SessionRegistry,
    /// Whether completion alerts are silent
    pub muted: bool,
    /// Tab selected when the daemon last ran
    pub active_kind: SessionKind,
}

// ============================================================================
// SettingsStore
// ============================================================================

/// Reads and writes [`Settings`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns `~/.pomotab/settings.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::home_dir()
            .map(|home| home.join(APP_DIR).join(SETTINGS_FILE))
            .ok_or(SettingsError::HomeDirNotFound)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the settings file.
    ///
    /// Returns `Ok(None)` if the file does not exist. Durations above the
    /// input bound are capped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(&self) -> Result<Option<Settings>, SettingsError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut settings: Settings =
            serde_json::from_slice(&bytes).map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })?;
        settings.sessions = settings.sessions.clamped();

        Ok(Some(settings))
    }

    /// Loads the settings file, falling back to defaults on any failure.
    pub fn load_or_default(&self) -> Settings {
        match self.load() {
            Ok(Some(settings)) => {
                tracing::debug!(path = ?self.path, "settings loaded");
                settings
            }
            Ok(None) => {
                tracing::debug!(path = ?self.path, "no settings file, using defaults");
                Settings::default()
            }
            Err(e) => {
                tracing::warn!("{}; using default settings", e);
                Settings::default()
            }
        }
    }

    /// Writes the settings file, creating its directory if needed.
    ///
    /// The file is written to a temporary sibling first and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem operation fails.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_vec_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;

        tracing::debug!(path = ?self.path, "settings saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
