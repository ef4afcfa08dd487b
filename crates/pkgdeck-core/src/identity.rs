use std::cmp::Ordering;
use std::fmt;

use anyhow::{anyhow, Result};

use crate::version::{compare_versions, VersionError, VersionKey};

/// A package name paired with its raw version string.
///
/// Equality is exact on both strings: `demo@1.0` and `demo@1.0.0` are
/// different identities even though their version keys are equal. Use
/// [`PackageIdentity::cmp_version`] when numeric ordering is wanted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageIdentity {
    id: String,
    version: String,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn version_key(&self) -> Result<VersionKey, VersionError> {
        VersionKey::parse(&self.version)
    }

    pub fn same_package(&self, other: &Self) -> bool {
        self.id == other.id
    }

    pub fn is_exact(&self, other: &Self) -> bool {
        self == other
    }

    pub fn cmp_version(&self, other: &Self) -> Result<Ordering, VersionError> {
        compare_versions(&self.version, &other.version)
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// Splits `id@version` into its parts; a bare `id` has no version.
pub fn parse_spec(spec: &str) -> Result<(String, Option<String>)> {
    let spec = spec.trim();
    let (id, version) = match spec.split_once('@') {
        Some((id, version)) => (id.trim(), Some(version.trim())),
        None => (spec, None),
    };
    if id.is_empty() {
        return Err(anyhow!("package spec '{spec}' has an empty name"));
    }
    match version {
        Some("") => Err(anyhow!("package spec '{spec}' has an empty version")),
        Some(version) => Ok((id.to_string(), Some(version.to_string()))),
        None => Ok((id.to_string(), None)),
    }
}
