//! Command-line store paths
//!
//! A store path has the format `profile[/key]`. The key part is relative to
//! the profile's root prefix and is normalized before use.

use crate::error::{Error, Result};
use crate::key;

/// A parsed `profile[/key]` path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePath {
    /// Profile name
    pub profile: String,
    /// Normalized logical key (empty for the store root)
    pub key: String,
}

impl StorePath {
    /// Create a new StorePath
    pub fn new(profile: impl Into<String>, key: &str) -> Result<Self> {
        Ok(Self {
            profile: profile.into(),
            key: key::normalize(key)?,
        })
    }

    /// Whether the path points at the store root
    pub fn is_root(&self) -> bool {
        self.key.is_empty()
    }

    /// The key, or `None` for the store root
    pub fn key(&self) -> Option<&str> {
        (!self.key.is_empty()).then_some(self.key.as_str())
    }

    /// Get the parent path (one level up)
    pub fn parent(&self) -> Option<Self> {
        if self.key.is_empty() {
            return None;
        }
        let key = match self.key.rfind('/') {
            Some(pos) => self.key[..pos].to_string(),
            None => String::new(),
        };
        Some(Self {
            profile: self.profile.clone(),
            key,
        })
    }

    /// Join a child key
    pub fn join(&self, child: &str) -> Result<Self> {
        Ok(Self {
            profile: self.profile.clone(),
            key: key::join(&self.key, child)?,
        })
    }
}

impl std::fmt::Display for StorePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.profile)
        } else {
            write!(f, "{}/{}", self.profile, self.key)
        }
    }
}

/// Parse a `profile[/key]` string
pub fn parse_path(path: &str) -> Result<StorePath> {
    if path.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }

    let (profile, key) = match path.split_once('/') {
        Some((profile, key)) => (profile, key),
        None => (path, ""),
    };

    if !is_valid_profile_name(profile) {
        return Err(Error::InvalidPath(format!(
            "'{path}' does not start with a profile name. Use format: profile[/key]"
        )));
    }

    StorePath::new(profile, key)
}

/// Check if a string is a valid profile name
pub fn is_valid_profile_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_with_key() {
        let path = parse_path("demo/c/e/f").unwrap();
        assert_eq!(path.profile, "demo");
        assert_eq!(path.key, "c/e/f");
        assert_eq!(path.key(), Some("c/e/f"));
        assert!(!path.is_root());
    }

    #[test]
    fn test_parse_path_profile_only() {
        for raw in ["demo", "demo/", "demo//"] {
            let path = parse_path(raw).unwrap();
            assert_eq!(path.profile, "demo");
            assert!(path.is_root());
            assert_eq!(path.key(), None);
        }
    }

    #[test]
    fn test_parse_path_normalizes_key() {
        let path = parse_path("demo//c//d/").unwrap();
        assert_eq!(path.key, "c/d");
    }

    #[test]
    fn test_parse_path_errors() {
        assert!(matches!(parse_path(""), Err(Error::InvalidPath(_))));
        assert!(matches!(parse_path("/abs/key"), Err(Error::InvalidPath(_))));
        assert!(matches!(parse_path("bad.name/key"), Err(Error::InvalidPath(_))));
        assert!(matches!(parse_path("demo/../x"), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_store_path_parent() {
        let path = parse_path("demo/a/b/c").unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.key, "a/b");

        let parent = parent.parent().unwrap().parent().unwrap();
        assert!(parent.is_root());
        assert!(parent.parent().is_none());
    }

    #[test]
    fn test_store_path_join_and_display() {
        let root = parse_path("demo").unwrap();
        assert_eq!(root.to_string(), "demo");

        let child = root.join("c").unwrap().join("d").unwrap();
        assert_eq!(child.key, "c/d");
        assert_eq!(child.to_string(), "demo/c/d");
    }
}
