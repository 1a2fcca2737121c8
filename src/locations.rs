//! Resource location resolution
//!
//! A schema URI is either a filesystem path or a URL. Relative
//! `schemaLocation` values of includes and imports are resolved against
//! the location of the document that contains them.

use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Resource location - a URL or a file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// Non-file URL (http, https, ...)
    Url(Url),
}

impl Location {
    /// Create a location from a string (auto-detect type).
    ///
    /// `file:` URLs become paths; other absolute URLs stay URLs; anything
    /// else is taken as a (possibly relative) filesystem path.
    pub fn parse(s: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(s) {
            // A single-letter scheme is a Windows drive, not a URL
            if url.scheme().len() > 1 {
                if url.scheme() == "file" {
                    if let Ok(path) = url.to_file_path() {
                        return Ok(Location::Path(path));
                    }
                }
                return Ok(Location::Url(url));
            }
        }

        Ok(Location::Path(PathBuf::from(s)))
    }

    /// Resolve a reference relative to this location
    pub fn join(&self, reference: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(reference) {
            if url.scheme().len() > 1 {
                return Self::parse(reference);
            }
        }

        match self {
            Location::Path(base) => {
                let reference = Path::new(reference);
                if reference.is_absolute() {
                    return Ok(Location::Path(reference.to_path_buf()));
                }
                let dir = base.parent().unwrap_or_else(|| Path::new(""));
                Ok(Location::Path(dir.join(reference)))
            }
            Location::Url(base) => Ok(Location::Url(base.join(reference)?)),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }

    /// Key used to load each schema document at most once
    pub fn canonical_key(&self) -> String {
        match self {
            Location::Path(p) => std::fs::canonicalize(p)
                .unwrap_or_else(|_| p.clone())
                .to_string_lossy()
                .to_string(),
            Location::Url(u) => u.to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path(p) => write!(f, "{}", p.display()),
            Location::Url(u) => write!(f, "{}", u),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_url() {
        let loc = Location::parse("http://example.com/schema.xsd").unwrap();
        assert!(matches!(loc, Location::Url(_)));
        assert!(loc.is_remote());
    }

    #[test]
    fn test_location_from_path() {
        let loc = Location::parse("/tmp/schema.xsd").unwrap();
        assert_eq!(loc, Location::Path(PathBuf::from("/tmp/schema.xsd")));
        assert!(loc.is_file());

        let loc = Location::parse("schemas/book.xsd").unwrap();
        assert!(loc.is_file());
    }

    #[test]
    fn test_file_url_becomes_path() {
        let loc = Location::parse("file:///tmp/schema.xsd").unwrap();
        assert_eq!(loc, Location::Path(PathBuf::from("/tmp/schema.xsd")));
    }

    #[test]
    fn test_join_relative_path() {
        let base = Location::parse("/schemas/main.xsd").unwrap();
        let joined = base.join("types/common.xsd").unwrap();
        assert_eq!(joined, Location::Path(PathBuf::from("/schemas/types/common.xsd")));

        let absolute = base.join("/other/x.xsd").unwrap();
        assert_eq!(absolute, Location::Path(PathBuf::from("/other/x.xsd")));
    }

    #[test]
    fn test_join_relative_url() {
        let base = Location::parse("http://example.com/a/main.xsd").unwrap();
        let joined = base.join("common.xsd").unwrap();
        assert_eq!(joined.to_string(), "http://example.com/a/common.xsd");
    }
}
