//! Frame range detection.
//!
//! Priority:
//! 1. Read nodes: trust their own `first`/`last` knobs
//! 2. Disk: glob `basename*.ext`, take numeric min/max of frame numbers
//! 3. Fallback: explicit `first`/`last` when `use_limit` is on, else the
//!    upstream range
//!
//! Frame numbers are compared as integers, so mixed padding
//! ("9" vs "10") orders correctly.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::descriptor::{SequenceDescriptor, last_frame_number};
use crate::error::{ReadError, Result};
use crate::host::Host;

/// Inclusive frame range. Always `last >= first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub first: i64,
    pub last: i64,
}

impl FrameRange {
    /// Build a range, collapsing `last` onto `first` when it is smaller
    /// (negative `last` is the "unknown" sentinel).
    pub fn new(first: i64, last: i64) -> Self {
        Self {
            first,
            last: if last < first { first } else { last },
        }
    }

    pub fn frame_count(&self) -> i64 {
        self.last - self.first + 1
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// Where a range came from (for logging and reports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSource {
    /// `first`/`last` knobs of a Read node
    Metadata,
    /// Frame numbers of files on disk
    Disk,
    /// `first`/`last` knobs with `use_limit` enabled
    Explicit,
    /// Range of the node's input
    Upstream,
}

/// Knob names consulted for ranges.
pub const KNOB_FIRST: &str = "first";
pub const KNOB_LAST: &str = "last";
pub const KNOB_USE_LIMIT: &str = "use_limit";

/// Glob `pattern` and return the numeric (min, max) frame numbers found.
///
/// Files without a digit run are ignored; `None` when nothing matched.
pub fn scan_disk(pattern: &str) -> Result<Option<FrameRange>> {
    let entries = glob::glob(pattern).map_err(|source| ReadError::Glob {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut frames: Vec<i64> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("scan_disk: skipping unreadable entry {}: {}", e.path().display(), e.error());
                None
            }
        })
        .filter_map(|path| last_frame_number(&path.to_string_lossy()))
        .collect();
    frames.sort_unstable();

    debug!("scan_disk: {} -> {} frames", pattern, frames.len());

    match (frames.first(), frames.last()) {
        (Some(&first), Some(&last)) => Ok(Some(FrameRange::new(first, last))),
        _ => Ok(None),
    }
}

/// Range stored on a Read node (`first`/`last` knobs), if `class` is the reader class.
pub fn metadata_range<H: Host + ?Sized>(host: &H, item: &str, reader_class: &str) -> Option<FrameRange> {
    if host.item_class(item).as_deref() != Some(reader_class) {
        return None;
    }
    let first = host.knob(item, KNOB_FIRST)?.as_i64()?;
    let last = host.knob(item, KNOB_LAST)?.as_i64()?;
    Some(FrameRange::new(first, last))
}

/// Range used when nothing is on disk: explicit limits or upstream.
pub fn fallback_range<H: Host + ?Sized>(host: &H, item: &str) -> (FrameRange, RangeSource) {
    let limited = host
        .knob(item, KNOB_USE_LIMIT)
        .map(|v| v.as_bool())
        .unwrap_or(false);

    if limited {
        let first = host.knob(item, KNOB_FIRST).and_then(|v| v.as_i64());
        let last = host.knob(item, KNOB_LAST).and_then(|v| v.as_i64());
        if let (Some(first), Some(last)) = (first, last) {
            return (FrameRange::new(first, last), RangeSource::Explicit);
        }
    }

    (host.upstream_range(item), RangeSource::Upstream)
}

/// Resolve the frame range for `item` whose file knob points at `descriptor`.
///
/// Single-file formats skip the disk scan: numbers in a movie's name are
/// versions, not frames.
pub fn resolve_range<H: Host + ?Sized>(
    host: &H,
    item: &str,
    descriptor: &SequenceDescriptor,
    reader_class: &str,
) -> Result<(FrameRange, RangeSource)> {
    if let Some(range) = metadata_range(host, item, reader_class) {
        return Ok((range, RangeSource::Metadata));
    }

    if !descriptor.is_single_file {
        if let Some(range) = scan_disk(&descriptor.glob_pattern())? {
            return Ok((range, RangeSource::Disk));
        }
    }

    Ok(fallback_range(host, item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::describe;
    use crate::session::{Root, SceneNode, Session};
    use std::fs;
    use tempfile::TempDir;

    fn formats() -> Vec<String> {
        vec!["mov".into(), "mp4".into()]
    }

    fn touch(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, b"").unwrap();
        path.to_string_lossy().replace('\\', "/")
    }

    fn session_with(node: SceneNode) -> Session {
        let mut s = Session::new(Root {
            first_frame: 1001,
            last_frame: 1100,
            ..Root::default()
        });
        s.add_node(node);
        s
    }

    #[test]
    fn test_new_collapses_negative_last() {
        assert_eq!(FrameRange::new(5, -1), FrameRange { first: 5, last: 5 });
        assert_eq!(FrameRange::new(5, 3).last, 5);
        assert_eq!(FrameRange::new(1, 10).frame_count(), 10);
    }

    #[test]
    fn test_scan_disk_min_max() {
        let dir = TempDir::new().unwrap();
        let mut first = String::new();
        for i in 1..=10 {
            let p = touch(&dir, &format!("seq.{:04}.exr", i));
            if i == 1 {
                first = p;
            }
        }
        touch(&dir, "other.0050.exr");

        let d = describe(&first, &formats()).unwrap();
        let range = scan_disk(&d.glob_pattern()).unwrap().unwrap();
        assert_eq!(range, FrameRange { first: 1, last: 10 });
    }

    #[test]
    fn test_scan_disk_sorts_numerically() {
        let dir = TempDir::new().unwrap();
        let p = touch(&dir, "seq.9.exr");
        touch(&dir, "seq.10.exr");
        touch(&dir, "seq.100.exr");

        let d = describe(&p, &formats()).unwrap();
        let range = scan_disk(&d.glob_pattern()).unwrap().unwrap();
        assert_eq!(range, FrameRange { first: 9, last: 100 });
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_disk_skips_unreadable_dirs() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let open = dir.path().join("a");
        let locked = dir.path().join("b");
        fs::create_dir_all(&open).unwrap();
        fs::create_dir_all(&locked).unwrap();
        fs::write(open.join("seq.0003.exr"), b"").unwrap();
        fs::write(open.join("seq.0007.exr"), b"").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let pattern = format!("{}/*/seq.*.exr", dir.path().to_string_lossy().replace('\\', "/"));
        let range = scan_disk(&pattern);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(range.unwrap(), Some(FrameRange { first: 3, last: 7 }));
    }

    #[test]
    fn test_scan_disk_nothing() {
        let dir = TempDir::new().unwrap();
        let pattern = format!("{}/seq.*.exr", dir.path().to_string_lossy());
        assert_eq!(scan_disk(&pattern).unwrap(), None);
    }

    #[test]
    fn test_reader_metadata_wins_without_disk() {
        let s = session_with(
            SceneNode::new("Read1", "Read")
                .knob("file", "/nowhere/seq.####.exr")
                .knob("first", 5i64)
                .knob("last", 5i64),
        );
        let d = describe("/nowhere/seq.0005.exr", &formats()).unwrap();
        let (range, source) = resolve_range(&s, "Read1", &d, "Read").unwrap();
        assert_eq!(range, FrameRange { first: 5, last: 5 });
        assert_eq!(source, RangeSource::Metadata);
    }

    #[test]
    fn test_writer_disk_range() {
        let dir = TempDir::new().unwrap();
        let p = touch(&dir, "beauty.0003.exr");
        touch(&dir, "beauty.0007.exr");
        let s = session_with(SceneNode::new("Write1", "Write").knob("file", p.as_str()));
        let d = describe(&p, &formats()).unwrap();
        let (range, source) = resolve_range(&s, "Write1", &d, "Read").unwrap();
        assert_eq!(range, FrameRange { first: 3, last: 7 });
        assert_eq!(source, RangeSource::Disk);
    }

    #[test]
    fn test_fallback_explicit_limit() {
        let s = session_with(
            SceneNode::new("Write1", "Write")
                .knob("use_limit", true)
                .knob("first", 10i64)
                .knob("last", 20i64),
        );
        let d = describe("/nowhere/seq.0001.exr", &formats()).unwrap();
        let (range, source) = resolve_range(&s, "Write1", &d, "Read").unwrap();
        assert_eq!(range, FrameRange { first: 10, last: 20 });
        assert_eq!(source, RangeSource::Explicit);
    }

    #[test]
    fn test_fallback_upstream_when_limit_off() {
        let s = session_with(
            SceneNode::new("Write1", "Write")
                .knob("use_limit", false)
                .knob("first", 10i64)
                .knob("last", 20i64),
        );
        let d = describe("/nowhere/seq.0001.exr", &formats()).unwrap();
        let (range, source) = resolve_range(&s, "Write1", &d, "Read").unwrap();
        assert_eq!(range, FrameRange { first: 1001, last: 1100 });
        assert_eq!(source, RangeSource::Upstream);
    }

    #[test]
    fn test_movie_skips_disk() {
        let dir = TempDir::new().unwrap();
        let p = touch(&dir, "edit_v3.mov");
        touch(&dir, "edit_v4.mov");
        let s = session_with(SceneNode::new("Write1", "Write").knob("file", p.as_str()));
        let d = describe(&p, &formats()).unwrap();
        let (_, source) = resolve_range(&s, "Write1", &d, "Read").unwrap();
        assert_eq!(source, RangeSource::Upstream);
    }
}
