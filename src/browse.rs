//! Open a node's directory, or a folder relative to the script, in the OS
//! file browser.
//!
//! Script folder layout assumed for `Shot`/`Sequence` targets:
//! `.../sequence/shot/nuke/scripts/script.nk`

use log::info;
use std::path::Path;
use std::process::Command;

use crate::config::Settings;
use crate::error::{ReadError, Result};
use crate::host::Host;

/// Folder relative to the saved script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BrowseTarget {
    /// Folder holding the script
    Scripts,
    /// Shot folder (three levels up)
    Shot,
    /// Sequence folder (four levels up)
    Sequence,
}

impl BrowseTarget {
    /// Trailing path components dropped from the script path.
    fn strip(self) -> usize {
        match self {
            BrowseTarget::Scripts => 1,
            BrowseTarget::Shot => 3,
            BrowseTarget::Sequence => 4,
        }
    }
}

/// Directory part of a file path: everything before the last `/`.
pub fn folder_of(path: &str) -> String {
    let path = path.replace('\\', "/");
    match path.rfind('/') {
        Some(i) => path[..i].to_string(),
        None => String::new(),
    }
}

/// Folder for `target` relative to `script_path`, with trailing `/`.
pub fn script_folder(script_path: &str, target: BrowseTarget) -> String {
    let script_path = script_path.replace('\\', "/");
    let parts: Vec<&str> = script_path.split('/').collect();
    let keep = parts.len().saturating_sub(target.strip());
    parts[..keep].iter().map(|p| format!("{}/", p)).collect()
}

/// Open `directory` in the file browser, or notify if it does not exist.
pub fn launch<H: Host + ?Sized>(host: &mut H, directory: &str) -> Result<()> {
    info!("Attempting to open folder: {}", directory);
    if directory.is_empty() || !Path::new(directory).exists() {
        host.notify(&format!("Path does not exist:\n{}", directory));
        return Ok(());
    }

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(directory.replace('/', "\\")).spawn()?;
    #[cfg(target_os = "macos")]
    Command::new("open").arg(directory).spawn()?;
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    Command::new("xdg-open").arg(directory).spawn()?;

    Ok(())
}

/// Directory of the first selected node's file knob.
pub fn node_folder<H: Host + ?Sized>(host: &H, settings: &Settings) -> Result<String> {
    let item = host.selected_items().into_iter().next().ok_or(ReadError::NoSelection)?;
    let knob = settings
        .filepath_knobs
        .iter()
        .find(|k| host.has_knob(&item, k))
        .ok_or_else(|| ReadError::MissingKnob {
            item: item.clone(),
            knob: settings.filepath_knobs.join("|"),
        })?;
    let value = host.evaluate(&item, knob).unwrap_or_default();
    Ok(folder_of(&value))
}

/// Open the folder of the selected node's file.
pub fn browse_dir_by_node<H: Host + ?Sized>(host: &mut H, settings: &Settings) -> Result<()> {
    match node_folder(&*host, settings) {
        Ok(folder) => launch(host, &folder),
        Err(ReadError::NoSelection) => {
            host.notify("No node selected.");
            Ok(())
        }
        Err(ReadError::MissingKnob { .. }) => {
            host.notify("You must select a Read node or a Write node.");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Open a folder relative to the saved script.
pub fn browse_dir<H: Host + ?Sized>(host: &mut H, target: BrowseTarget) -> Result<()> {
    let Some(script) = host.script_name() else {
        host.notify("You need to save the script first!");
        return Ok(());
    };
    let folder = script_folder(&script, target);
    launch(host, &folder)
}
