//! File-path resolution.
//!
//! A file knob may hold a literal path, an expression, or a path relative to
//! the project directory. Attempts, first hit wins:
//!
//! 1. raw knob value exists on disk
//! 2. evaluated knob value exists on disk
//! 3. project directory + evaluated value: the exact file, or any sibling
//!    frame sharing its basename and extension (the current frame may not
//!    be rendered yet)
//!
//! Resolved paths are absolute with forward slashes on every platform.

use log::debug;
use std::path::Path;

use crate::descriptor::describe;
use crate::error::Result;
use crate::range::scan_disk;

/// How a path was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOrigin {
    /// Raw knob value
    Literal,
    /// Knob value after expression evaluation
    Evaluated,
    /// Evaluated value joined onto the project directory
    Combined { relative: String },
}

/// Absolute, forward-slash path confirmed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: String,
    pub origin: PathOrigin,
}

fn has_drive(path: &str) -> bool {
    let b = path.as_bytes();
    b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':'
}

/// Absolute in either POSIX (`/a`, `//server/a`) or Windows (`C:/a`) form.
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\') || has_drive(path)
}

fn split_root(path: &str) -> (String, &str) {
    if let Some(rest) = path.strip_prefix("//") {
        ("//".to_string(), rest)
    } else if let Some(rest) = path.strip_prefix('/') {
        ("/".to_string(), rest)
    } else if has_drive(path) {
        let rest = path[2..].trim_start_matches('/');
        (format!("{}/", &path[..2]), rest)
    } else {
        (String::new(), path)
    }
}

/// Collapse `.`/`..`/empty segments without touching the filesystem.
fn clean(path: &str) -> String {
    let (root, rest) = split_root(path);
    let mut parts: Vec<&str> = Vec::new();
    for seg in rest.split('/') {
        match seg {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if root.is_empty() => parts.push(".."),
                _ => {}
            },
            s => parts.push(s),
        }
    }
    format!("{}{}", root, parts.join("/"))
}

/// Make `path` absolute (against the working directory) with `/` separators.
///
/// Lexical only: the path does not need to exist and symlinks are kept.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    if is_absolute(&unified) {
        return clean(&unified);
    }
    let cwd = std::env::current_dir()
        .map(|d| d.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    clean(&format!("{}/{}", cwd, unified))
}

/// Join a possibly-relative `path` onto `root`. Absolute paths win.
pub fn join_project(root: &str, path: &str) -> String {
    if is_absolute(path) {
        path.to_string()
    } else {
        format!("{}/{}", root.trim_end_matches(['/', '\\']), path)
    }
}

fn exists(path: &str) -> bool {
    !path.is_empty() && Path::new(path).exists()
}

/// Project directory + evaluated value, if the file or any sibling frame exists.
fn combined_path(root: &str, evaluated: &str, single_file_formats: &[String]) -> Result<Option<String>> {
    let combined = normalize_path(&join_project(root, evaluated));
    if exists(&combined) {
        return Ok(Some(combined));
    }

    let descriptor = describe(&combined, single_file_formats)?;
    let found = scan_disk(&descriptor.glob_pattern())?.is_some();
    debug!("combined_path: {} -> {}", combined, found);
    Ok(found.then_some(combined))
}

/// Resolve a file knob to a path on disk.
///
/// `Ok(None)` means nothing matched. Errors only when the combined path has
/// no frame number to search siblings with.
pub fn resolve(
    raw: &str,
    evaluated: &str,
    project_root: Option<&str>,
    single_file_formats: &[String],
) -> Result<Option<ResolvedPath>> {
    if exists(raw) {
        return Ok(Some(ResolvedPath {
            path: normalize_path(raw),
            origin: PathOrigin::Literal,
        }));
    }

    if exists(evaluated) {
        return Ok(Some(ResolvedPath {
            path: normalize_path(evaluated),
            origin: PathOrigin::Evaluated,
        }));
    }

    let Some(root) = project_root.filter(|r| !r.trim().is_empty()) else {
        return Ok(None);
    };
    if evaluated.is_empty() {
        return Ok(None);
    }

    Ok(combined_path(root, evaluated, single_file_formats)?.map(|path| ResolvedPath {
        path,
        origin: PathOrigin::Combined {
            relative: evaluated.replace('\\', "/"),
        },
    }))
}
