use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::panels::{MAX_PADDING, MIN_PADDING, PADDING_FACTOR};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "comikrat";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Overrides the library location under the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_dir: Option<PathBuf>,

    /// Fraction of the viewport a focused panel fills
    #[serde(default = "default_panel_padding")]
    pub panel_padding: f32,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Run panel detection as soon as a page opens in smart mode
    #[serde(default = "default_true")]
    pub auto_analyze: bool,
}

fn default_true() -> bool {
    true
}

fn default_panel_padding() -> f32 {
    PADDING_FACTOR
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            library_dir: None,
            panel_padding: default_panel_padding(),
            log_level: default_log_level(),
            auto_analyze: true,
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));
static SETTINGS_PATH: LazyLock<RwLock<Option<PathBuf>>> = LazyLock::new(|| RwLock::new(None));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    load_settings_from(&path);
}

/// Load settings from `path`, creating the file with defaults if missing.
/// Later saves go to the same path.
pub fn load_settings_from(path: &Path) {
    if let Ok(mut current) = SETTINGS_PATH.write() {
        *current = Some(path.to_path_buf());
    }

    if !path.exists() {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(mut global) = SETTINGS.write() {
            *global = Settings::default();
            save_settings_to_file(&global, path);
        }
        return;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                let clamped = crate::panels::clamp_padding(settings.panel_padding);
                if clamped != settings.panel_padding {
                    warn!(
                        "panel_padding {} outside {MIN_PADDING}..={MAX_PADDING}, using {clamped}",
                        settings.panel_padding
                    );
                    settings.panel_padding = clamped;
                }

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }

                if let Ok(mut global) = SETTINGS.write() {
                    *global = settings;
                }
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_settings() {
    let path = SETTINGS_PATH
        .read()
        .ok()
        .and_then(|p| p.clone())
        .or_else(preferred_config_path);
    let Some(path) = path else {
        warn!("Could not determine config directory, cannot save settings");
        return;
    };

    if let Ok(settings) = SETTINGS.read() {
        save_settings_to_file(&settings, &path);
    }
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    match serde_yaml::to_string(settings) {
        Ok(content) => match fs::write(path, format!("{SETTINGS_HEADER}{content}")) {
            Ok(()) => debug!("Saved settings to {path:?}"),
            Err(e) => error!("Failed to save settings to {path:?}: {e}"),
        },
        Err(e) => error!("Failed to serialize settings: {e}"),
    }
}

const SETTINGS_HEADER: &str = "\
# comikrat settings
#
# library_dir:    where imported comics are stored (default: data dir)
# panel_padding:  share of the screen a focused panel fills, 0.85 to 0.95
# log_level:      off, error, warn, info, debug or trace
# auto_analyze:   detect panels when a page opens in smart mode
";

// Public API for accessing/modifying settings

pub fn current() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn get_library_dir() -> Option<PathBuf> {
    SETTINGS.read().ok().and_then(|s| s.library_dir.clone())
}

pub fn set_library_dir(dir: Option<PathBuf>) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.library_dir = dir;
    }
    save_settings();
}

pub fn get_panel_padding() -> f32 {
    SETTINGS
        .read()
        .map(|s| s.panel_padding)
        .unwrap_or_else(|_| default_panel_padding())
}

pub fn set_panel_padding(padding: f32) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.panel_padding = crate::panels::clamp_padding(padding);
    }
    save_settings();
}

pub fn get_log_level() -> String {
    SETTINGS
        .read()
        .map(|s| s.log_level.clone())
        .unwrap_or_else(|_| default_log_level())
}

pub fn set_log_level(level: &str) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.log_level = level.to_string();
    }
    save_settings();
}

pub fn is_auto_analyze() -> bool {
    SETTINGS.read().map(|s| s.auto_analyze).unwrap_or(true)
}

pub fn set_auto_analyze(enabled: bool) {
    if let Ok(mut settings) = SETTINGS.write() {
        settings.auto_analyze = enabled;
    }
    save_settings();
}
