use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::browse::BrowseTarget;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Create Read nodes from Write nodes in a saved scene
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging to file (default: readback.log in the data dir)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE", global = true)]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a Read node below every selected node with a file knob
    ReadFromWrite {
        /// Scene file (JSON)
        #[arg(value_name = "SCENE")]
        scene: PathBuf,

        /// Answer "yes" when asked to proceed without files on disk
        #[arg(short = 'y', long = "yes", conflicts_with = "no")]
        yes: bool,

        /// Answer "no" when asked to proceed without files on disk
        #[arg(short = 'n', long = "no")]
        no: bool,

        /// Override the scene's project directory
        #[arg(short = 'p', long = "project-dir", value_name = "DIR")]
        project_dir: Option<String>,

        /// Select these nodes instead of the scene's selection (repeatable)
        #[arg(short = 's', long = "select", value_name = "NODE")]
        select: Vec<String>,

        /// Write the updated scene here instead of printing the report
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Open the selected node's folder, or a folder relative to the script
    Browse {
        /// Scene file (JSON)
        #[arg(value_name = "SCENE")]
        scene: PathBuf,

        /// Script-relative folder; omit to use the selected node's file
        #[arg(short = 't', long = "target", value_enum)]
        target: Option<BrowseTarget>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read_from_write() {
        let args = Args::try_parse_from([
            "readback", "-vv", "read-from-write", "scene.json", "--yes", "-s", "Write1", "-s", "Write2",
        ])
        .unwrap();
        assert_eq!(args.verbosity, 2);
        match args.command {
            Command::ReadFromWrite { scene, yes, no, select, .. } => {
                assert_eq!(scene, PathBuf::from("scene.json"));
                assert!(yes);
                assert!(!no);
                assert_eq!(select, vec!["Write1".to_string(), "Write2".to_string()]);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_yes_conflicts_with_no() {
        assert!(Args::try_parse_from(["readback", "read-from-write", "s.json", "--yes", "--no"]).is_err());
    }

    #[test]
    fn test_parse_browse_target() {
        let args = Args::try_parse_from(["readback", "browse", "s.json", "--target", "shot"]).unwrap();
        assert!(matches!(args.command, Command::Browse { target: Some(BrowseTarget::Shot), .. }));
    }
}
