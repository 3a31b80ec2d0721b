//! Sequence descriptor extraction.
//!
//! Splits a resolved path into the parts needed to rebuild a sequence
//! pattern: the prefix before the frame number, the frame number's width
//! and the file extension.
//!
//! The frame number is the LAST run of digits before the extension.
//! Digits earlier in the path (shot numbers in directory names, versions
//! in the basename) are ignored.
//!
//! ```text
//! /shots/sh010/render/beauty_v002.0042.exr
//! |---------- basename ----------||pad||ext
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{ReadError, Result};

lazy_static! {
    static ref DIGITS: Regex = Regex::new(r"\d+").unwrap();
}

/// Parts of a sequence (or single-file) path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDescriptor {
    /// Everything before the frame number, directory included.
    pub basename: String,
    /// Width of the frame-number token ("0042" -> 4). Zero for
    /// single-file formats without digits.
    pub padding: usize,
    /// Extension without the dot, as written in the path.
    pub file_type: String,
    /// True for containers holding the whole range (movies).
    pub is_single_file: bool,
    /// Frame number found in the path, if any.
    pub frame: Option<i64>,
}

impl SequenceDescriptor {
    /// Wildcard pattern matching every frame on disk: `basename*.ext`.
    ///
    /// The basename is escaped so brackets in directory names are literal.
    pub fn glob_pattern(&self) -> String {
        format!("{}*.{}", glob::Pattern::escape(&self.basename), self.file_type)
    }
}

/// Check extension against the single-file format list (case-insensitive).
pub fn is_single_file_format(file_type: &str, formats: &[String]) -> bool {
    formats.iter().any(|f| f.eq_ignore_ascii_case(file_type))
}

/// Split `path` into (body, extension). Only a dot inside the last path
/// component counts as an extension separator.
pub fn split_extension(path: &str) -> (&str, Option<&str>) {
    let name_start = path.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    match path[name_start..].rfind('.') {
        Some(dot) => {
            let dot = name_start + dot;
            (&path[..dot], Some(&path[dot + 1..]))
        }
        None => (path, None),
    }
}

/// Last digit run of `path` (extension excluded) parsed as a frame number.
pub fn last_frame_number(path: &str) -> Option<i64> {
    let (body, _) = split_extension(path);
    DIGITS
        .find_iter(body)
        .last()
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Extract a [`SequenceDescriptor`] from a resolved path.
///
/// Sequences must carry a frame number; single-file formats may not.
pub fn describe(path: &str, single_file_formats: &[String]) -> Result<SequenceDescriptor> {
    let (body, ext) = split_extension(path);
    let file_type = ext.unwrap_or_default().to_string();
    let is_single_file = is_single_file_format(&file_type, single_file_formats);

    match DIGITS.find_iter(body).last() {
        Some(m) => Ok(SequenceDescriptor {
            basename: path[..m.start()].to_string(),
            padding: m.as_str().len(),
            file_type,
            is_single_file,
            frame: m.as_str().parse::<i64>().ok(),
        }),
        None if is_single_file => Ok(SequenceDescriptor {
            basename: body.to_string(),
            padding: 0,
            file_type,
            is_single_file,
            frame: None,
        }),
        None => Err(ReadError::NoFrameNumber(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movies() -> Vec<String> {
        vec!["mov".into(), "mp4".into(), "mpeg4".into()]
    }

    #[test]
    fn test_describe_sequence() {
        let d = describe("/proj/sh010/render/beauty_v002.0042.exr", &movies()).unwrap();
        assert_eq!(d.basename, "/proj/sh010/render/beauty_v002.");
        assert_eq!(d.padding, 4);
        assert_eq!(d.file_type, "exr");
        assert!(!d.is_single_file);
        assert_eq!(d.frame, Some(42));
    }

    #[test]
    fn test_describe_unpadded_and_underscore() {
        let d = describe("C:/renders/plate_7.dpx", &movies()).unwrap();
        assert_eq!(d.basename, "C:/renders/plate_");
        assert_eq!(d.padding, 1);
        assert_eq!(d.frame, Some(7));
    }

    #[test]
    fn test_describe_movie_ignores_extension_digits() {
        let d = describe("/proj/out/preview.mp4", &movies()).unwrap();
        assert!(d.is_single_file);
        assert_eq!(d.padding, 0);
        assert_eq!(d.basename, "/proj/out/preview");
        assert_eq!(d.file_type, "mp4");
        assert_eq!(d.frame, None);
    }

    #[test]
    fn test_describe_single_file_case_insensitive() {
        let d = describe("/proj/out/edit_v3.MOV", &movies()).unwrap();
        assert!(d.is_single_file);
        assert_eq!(d.frame, Some(3));
    }

    #[test]
    fn test_describe_no_digits_is_error() {
        let err = describe("/proj/out/beauty.exr", &movies()).unwrap_err();
        assert!(matches!(err, ReadError::NoFrameNumber(p) if p == "/proj/out/beauty.exr"));
    }

    #[test]
    fn test_split_extension_dot_in_directory() {
        assert_eq!(split_extension("/a.b/file"), ("/a.b/file", None));
        assert_eq!(split_extension("/a.b/file.1.exr"), ("/a.b/file.1", Some("exr")));
    }

    #[test]
    fn test_glob_pattern_escapes_brackets() {
        let d = describe("/r/[final]/seq.0001.exr", &movies()).unwrap();
        assert_eq!(d.glob_pattern(), "/r/[[]final[]]/seq.*.exr");
    }

    #[test]
    fn test_last_frame_number() {
        assert_eq!(last_frame_number("/r/v2/seq.0100.exr"), Some(100));
        assert_eq!(last_frame_number("/r/seq.exr"), None);
    }
}
