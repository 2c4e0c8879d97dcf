//! Configuration file persistence for phantom-card
//!
//! This module handles loading and saving the settings file and the theme
//! selection key to platform-specific directories with robust error
//! handling and graceful fallback to defaults.

use crate::config::Settings;
use crate::error::{Error, Result, ResultExt};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Application name used for the config directory
const APP_NAME: &str = "phantom-card";

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.json";

/// Key/value storage file name (holds the selected theme)
const STORAGE_FILE_NAME: &str = "storage.json";

/// Storage key holding the selected theme id
pub const THEME_STORAGE_KEY: &str = "anime-resume-theme";

// ─────────────────────────────────────────────────────────────────────────────
// Platform-Specific Directory Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Get the platform-specific configuration directory for the application.
///
/// - **Windows**: `%APPDATA%\phantom-card\`
/// - **macOS**: `~/Library/Application Support/phantom-card/`
/// - **Linux**: `~/.config/phantom-card/`
///
/// # Errors
///
/// Returns `Error::ConfigDirNotFound` if the config directory cannot be determined.
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(Error::ConfigDirNotFound)
}

/// Get the full path to the configuration file.
pub fn get_config_file_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE_NAME))
}

/// Ensure a directory exists, creating it if necessary.
fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        debug!("Creating config directory: {}", dir.display());
        fs::create_dir_all(dir).map_err(|e| Error::ConfigSave {
            path: dir.to_path_buf(),
            source: Box::new(e),
        })?;
    }
    Ok(())
}

/// Write `contents` next to `path` and rename it into place.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    let backup_path = PathBuf::from(backup);

    fs::write(&backup_path, contents).map_err(|e| Error::ConfigSave {
        path: backup_path.clone(),
        source: Box::new(e),
    })?;
    fs::rename(&backup_path, path).map_err(|e| Error::ConfigSave {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Load Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Load configuration from the default config file location.
///
/// # Behavior
///
/// 1. If the config file exists and is valid JSON, load and sanitize it
/// 2. If the config file doesn't exist, return default settings
/// 3. If the config file is corrupted/invalid, log a warning and return defaults
pub fn load_config() -> Settings {
    get_config_file_path()
        .and_then(|path| load_config_from(&path))
        .unwrap_or_warn_default(Settings::default(), "Failed to load configuration")
}

/// Load configuration from an explicit path.
pub fn load_config_from(config_path: &Path) -> Result<Settings> {
    if !config_path.exists() {
        debug!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        return Ok(Settings::default());
    }

    debug!("Loading config from: {}", config_path.display());

    let contents = fs::read_to_string(config_path).map_err(|e| Error::ConfigLoad {
        path: config_path.to_path_buf(),
        source: Box::new(e),
    })?;

    if contents.trim().is_empty() {
        debug!("Config file is empty, using defaults");
        return Ok(Settings::default());
    }

    let settings = Settings::from_json_sanitized(&contents).map_err(|e| {
        warn!(
            "Config file at {} contains invalid JSON: {}",
            config_path.display(),
            e
        );
        Error::ConfigParse {
            message: format!("Failed to parse config file: {}", e),
            source: Some(Box::new(e)),
        }
    })?;

    info!(
        "Configuration loaded successfully from {}",
        config_path.display()
    );
    Ok(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Save Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Save configuration to the default config file location.
///
/// # Errors
///
/// - `Error::ConfigDirNotFound`: Config directory cannot be determined
/// - `Error::ConfigSave`: Failed to write the config file
pub fn save_config(settings: &Settings) -> Result<()> {
    save_config_to(&get_config_file_path()?, settings)
}

/// Save configuration to an explicit path using an atomic write.
pub fn save_config_to(config_path: &Path, settings: &Settings) -> Result<()> {
    debug!("Saving config to: {}", config_path.display());

    let json = serde_json::to_string_pretty(settings).map_err(|e| Error::ConfigSave {
        path: config_path.to_path_buf(),
        source: Box::new(e),
    })?;
    write_atomic(config_path, &json)?;

    info!(
        "Configuration saved successfully to {}",
        config_path.display()
    );
    Ok(())
}

/// Save configuration, ignoring errors.
///
/// Returns `true` if the save was successful, `false` otherwise.
pub fn save_config_silent(settings: &Settings) -> bool {
    match save_config(settings) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to save configuration: {}", e);
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Theme Selection Storage
// ─────────────────────────────────────────────────────────────────────────────

/// Where the selected theme id is persisted.
///
/// `load` returns `None` for a missing or unreadable value; the engine
/// treats that the same as an unknown id and falls back to the default.
pub trait ThemeStorage {
    fn load(&self) -> Option<String>;
    fn save(&mut self, theme_id: &str) -> Result<()>;
}

/// In-memory storage, for tests and one-shot runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryThemeStorage {
    pub value: Option<String>,
    pub writes: usize,
}

impl MemoryThemeStorage {
    pub fn with_value(theme_id: &str) -> Self {
        Self {
            value: Some(theme_id.to_string()),
            writes: 0,
        }
    }
}

impl ThemeStorage for MemoryThemeStorage {
    fn load(&self) -> Option<String> {
        self.value.clone()
    }

    fn save(&mut self, theme_id: &str) -> Result<()> {
        self.value = Some(theme_id.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// A JSON key/value file, one entry of which is the theme selection.
#[derive(Debug, Clone)]
pub struct FileThemeStorage {
    path: PathBuf,
}

impl FileThemeStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `storage.json` in the platform config directory.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(get_config_dir()?.join(STORAGE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| Error::ConfigLoad {
            path: self.path.clone(),
            source: Box::new(e),
        })?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }
}

impl ThemeStorage for FileThemeStorage {
    fn load(&self) -> Option<String> {
        self.read_entries()
            .unwrap_or_warn_default(BTreeMap::new(), "Failed to read theme storage")
            .remove(THEME_STORAGE_KEY)
            .filter(|id| !id.trim().is_empty())
    }

    fn save(&mut self, theme_id: &str) -> Result<()> {
        // Keep unrelated keys; a corrupted file is replaced.
        let mut entries = self
            .read_entries()
            .unwrap_or_warn_default(BTreeMap::new(), "Replacing unreadable theme storage");
        entries.insert(THEME_STORAGE_KEY.to_string(), theme_id.to_string());
        let json = serde_json::to_string_pretty(&entries)?;
        write_atomic(&self.path, &json)?;
        debug!("Persisted theme \"{}\" to {}", theme_id, self.path.display());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
