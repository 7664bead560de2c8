//! Coordinate reference system identifier handling
//!
//! The zoning pipeline never reprojects: the CRS is an opaque identifier that
//! travels from the input rasters to the output layers unchanged. The only
//! interpretation offered is an EPSG-code convenience parser for callers that
//! want to sanity-check projected inputs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque CRS identifier, e.g. `"EPSG:32719"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs(String);

impl Crs {
    /// Wrap an identifier string.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// Build an `EPSG:<code>` identifier.
    pub fn from_epsg(code: u32) -> Self {
        Self(format!("EPSG:{code}"))
    }

    /// The identifier string, exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether any identifier was supplied at all.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Parse the EPSG code if the identifier is of the `EPSG:<code>` form.
    pub fn epsg(&self) -> Option<u32> {
        let rest = self
            .0
            .strip_prefix("EPSG:")
            .or_else(|| self.0.strip_prefix("epsg:"))?;
        rest.trim().parse().ok()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Crs {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Crs {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsg_roundtrip() {
        let crs = Crs::from_epsg(32719);
        assert_eq!(crs.as_str(), "EPSG:32719");
        assert_eq!(crs.epsg(), Some(32719));
    }

    #[test]
    fn test_opaque_identifier() {
        let crs = Crs::new("+proj=utm +zone=19 +south");
        assert_eq!(crs.epsg(), None);
        assert!(!crs.is_empty());
    }

    #[test]
    fn test_empty() {
        assert!(Crs::new("  ").is_empty());
    }
}
