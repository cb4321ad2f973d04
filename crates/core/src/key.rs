//! Key normalization
//!
//! Keys are slash-delimited paths. Every key passes through [`normalize`]
//! before it reaches the backend, so `p`, `/p`, `p/` and `p//` all name the
//! same location.

use crate::error::{Error, Result};

/// Key separator
pub const SEPARATOR: char = '/';

/// Normalize a key
///
/// Backslashes are treated as separators, runs of separators collapse and
/// leading/trailing separators are dropped. The empty string stays empty and
/// denotes the store root. Segments `.` and `..` are rejected.
pub fn normalize(path: &str) -> Result<String> {
    let path = path.replace('\\', "/");
    let segments: Vec<&str> = path.split(SEPARATOR).filter(|s| !s.is_empty()).collect();

    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(Error::InvalidKey(format!(
            "'{path}': segments '.' and '..' are not allowed"
        )));
    }

    Ok(segments.join("/"))
}

/// Join a normalized root prefix and a relative key into a physical name
pub fn join(prefix: &str, key: &str) -> Result<String> {
    if prefix.is_empty() {
        normalize(key)
    } else {
        normalize(&format!("{prefix}/{key}"))
    }
}

/// Listing prefix for everything strictly below `name`
///
/// Always ends with the separator so that `c/dx` never matches `c/d`.
/// The empty name (store root) yields the empty prefix.
pub fn dir_prefix(name: &str) -> String {
    if name.is_empty() {
        String::new()
    } else {
        format!("{name}/")
    }
}

/// First segment of a relative path
pub fn first_segment(rest: &str) -> &str {
    match rest.find(SEPARATOR) {
        Some(pos) => &rest[..pos],
        None => rest,
    }
}

/// Strip a directory prefix from a physical name
///
/// Returns `None` when `name` does not live under `prefix`.
pub fn strip_dir_prefix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix).filter(|rest| !rest.is_empty())
}
