//! READBACK - Read node generator library
//!
//! Infers an image sequence's location, padding and frame range from a
//! node's file knob and creates a matching Read node below it.
//!
//! Re-exports all modules for use by the binary target.

pub mod browse;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod format;
pub mod host;
pub mod options;
pub mod orchestrator;
pub mod range;
pub mod resolve;
pub mod session;

// Re-export commonly used types
pub use config::{PathConfig, Settings};
pub use descriptor::{SequenceDescriptor, describe};
pub use error::{ReadError, Result};
pub use format::{determine_relativity, format_path};
pub use host::{Host, ItemId, KnobValue, Position};
pub use options::{NodeOptions, collect_options};
pub use orchestrator::{ReadFromWrite, ReadInfo, ReadResult, Report, read_from_write};
pub use range::{FrameRange, RangeSource, resolve_range};
pub use resolve::{ResolvedPath, resolve};
pub use session::{ConfirmPolicy, Session};
