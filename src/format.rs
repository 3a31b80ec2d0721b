//! Path formatting for the new Read node.
//!
//! Sequences get a `#` placeholder of the detected padding in place of the
//! frame number; single-file formats keep the resolved path as is. Sequence
//! paths under the project directory are written relative to it (`./...`),
//! and knobs that were written with `../` stay relative.

use crate::descriptor::{SequenceDescriptor, describe};
use crate::error::Result;
use crate::resolve::{PathOrigin, ResolvedPath, is_absolute, normalize_path};

/// Placeholder character standing in for one frame digit
pub const FRAME_PLACEHOLDER: char = '#';

/// `basename` + `#` x padding + `.ext`
pub fn placeholder_path(descriptor: &SequenceDescriptor) -> String {
    format!(
        "{}{}.{}",
        descriptor.basename,
        FRAME_PLACEHOLDER.to_string().repeat(descriptor.padding),
        descriptor.file_type
    )
}

/// Replace a leading project directory with `.`.
///
/// `/proj` + `/proj/shots/a.0001.exr` -> `./shots/a.0001.exr`.
/// Only whole path components match: `/proj2/a` stays absolute.
pub fn determine_relativity(path: &str, project_root: Option<&str>) -> String {
    let Some(root) = project_root.filter(|r| !r.trim().is_empty()) else {
        return path.to_string();
    };
    let root = normalize_path(root);
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return path.to_string();
    }

    if path == root {
        return ".".to_string();
    }
    match path.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => format!(".{}", rest),
        _ => path.to_string(),
    }
}

/// Canonical file knob value for the Read node.
///
/// `raw` and `evaluated` are the knob as written and after evaluation. When
/// the raw value climbs with `../`, the sequence keeps the relative form the
/// matching attempt used instead of the absolute resolved path.
pub fn format_path(
    resolved: &ResolvedPath,
    descriptor: &SequenceDescriptor,
    raw: &str,
    evaluated: &str,
    project_root: Option<&str>,
    single_file_formats: &[String],
) -> Result<String> {
    if descriptor.is_single_file {
        return Ok(resolved.path.clone());
    }

    if raw.replace('\\', "/").contains("../") {
        let given = match &resolved.origin {
            PathOrigin::Literal => raw,
            PathOrigin::Evaluated => evaluated,
            PathOrigin::Combined { relative } => relative.as_str(),
        };
        let given = given.replace('\\', "/");
        if !is_absolute(&given) {
            return Ok(placeholder_path(&describe(&given, single_file_formats)?));
        }
    }

    Ok(determine_relativity(&placeholder_path(descriptor), project_root))
}
