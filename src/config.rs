//! Configuration: directory resolution and tool settings.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::filter::{DriveMap, default_drive_maps};

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "readback.json";

/// Configuration for overriding default application paths
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Create PathConfig from CLI arguments and environment variables
    ///
    /// Priority: CLI args → ENV var (READBACK_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| {
            std::env::var("READBACK_CONFIG_DIR")
                .ok()
                .map(PathBuf::from)
        });

        Self { config_dir }
    }
}

/// Get path to a configuration file
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. READBACK_CONFIG_DIR environment variable
/// 3. Local folder IF readback.json exists there
/// 4. Platform-specific config directory from dirs-next (default)
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

/// Get path to a data file (logs)
///
/// Same priority as [`config_file`], falling back to the platform data dir.
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    get_data_dir(config).join(name)
}

/// Ensure that configuration and data directories exist
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = get_config_dir(config);
    let data_dir = get_data_dir(config);

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    }

    // Only create data_dir if it's different from config_dir
    if data_dir != config_dir && !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }

    Ok(())
}

fn has_local_config(dir: &Path) -> bool {
    dir.join(SETTINGS_FILE).exists()
}

fn get_config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_config(&current_dir) {
            return current_dir;
        }
    }

    if let Some(dir) = dirs_next::config_dir() {
        return dir.join("readback");
    }

    PathBuf::from(".")
}

fn get_data_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_config(&current_dir) {
            return current_dir;
        }
    }

    if let Some(dir) = dirs_next::data_dir() {
        return dir.join("readback");
    }

    PathBuf::from(".")
}

/// Tool settings. Every field has a default so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Knobs (on any node class) holding a file path to read back
    pub filepath_knobs: Vec<String>,
    /// Extensions stored as one file per range (no frame padding)
    pub single_file_formats: Vec<String>,
    /// Optional knobs copied from source to reader when both have them
    pub option_knobs: Vec<String>,
    /// Node class created for each result
    pub reader_class: String,
    /// Vertical gap between source node and new reader
    pub reader_margin: i64,
    /// Drive letter <-> mount point translation
    pub drive_maps: Vec<DriveMap>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filepath_knobs: vec!["file".into()],
            single_file_formats: vec!["mov".into(), "mp4".into(), "mpeg4".into()],
            option_knobs: vec!["colorspace".into(), "premultiplied".into(), "raw".into()],
            reader_class: "Read".into(),
            reader_margin: 20,
            drive_maps: default_drive_maps(),
        }
    }
}

impl Settings {
    /// Load from `path`. Missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Settings file not found, using defaults: {}", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
        Ok(settings)
    }

    /// Load from the resolved config dir; unreadable files fall back to defaults.
    pub fn load_or_default(config: &PathConfig) -> Self {
        let path = config_file(SETTINGS_FILE, config);
        match Self::load(&path) {
            Ok(s) => s,
            Err(e) => {
                warn!("{:#}; using default settings", e);
                Self::default()
            }
        }
    }
}
