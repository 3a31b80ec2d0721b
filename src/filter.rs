//! Filename filter: translate shared-storage paths between platforms.
//!
//! Windows workstations mount the file server as drive letters, macOS ones
//! under `/Volumes`. Paths written on one platform are rewritten on load so
//! they resolve on the other.

use serde::{Deserialize, Serialize};

/// One drive letter <-> mount point pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveMap {
    /// Windows form, e.g. `X:`
    pub windows: String,
    /// macOS form, e.g. `/Volumes/Projects`
    pub macos: String,
}

impl DriveMap {
    pub fn new(windows: &str, macos: &str) -> Self {
        Self {
            windows: windows.to_string(),
            macos: macos.to_string(),
        }
    }
}

/// Default studio mounts.
pub fn default_drive_maps() -> Vec<DriveMap> {
    vec![
        DriveMap::new("X:", "/Volumes/Projects"),
        DriveMap::new("Y:", "/Volumes/Assets"),
    ]
}

/// Platform family a path is translated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }
}

/// Rewrite `path` for `platform`. Linux paths pass through untouched.
pub fn filename_filter(path: &str, platform: Platform, maps: &[DriveMap]) -> String {
    let mut out = path.to_string();
    for map in maps {
        match platform {
            Platform::MacOs => out = out.replace(&map.windows, &map.macos),
            Platform::Windows => out = out.replace(&map.macos, &map.windows),
            Platform::Other => {}
        }
    }
    out
}
